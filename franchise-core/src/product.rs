//! Catalog products stocked and sold by branches
//!
//! Prices are whole centavos.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, ValidationError, id::prefixed_id};

prefixed_id!(
    /// A unique identifier for a product, prefixed with `prd_`.
    ProductId,
    "prd",
    "product"
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Beverage,
    #[default]
    Ingredient,
    Supply,
    Packaging,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Beverage => "beverage",
            ProductCategory::Ingredient => "ingredient",
            ProductCategory::Supply => "supply",
            ProductCategory::Packaging => "packaging",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beverage" => Ok(ProductCategory::Beverage),
            "ingredient" => Ok(ProductCategory::Ingredient),
            "supply" => Ok(ProductCategory::Supply),
            "packaging" => Ok(ProductCategory::Packaging),
            _ => Err(ValidationError::InvalidField(format!("Invalid product category: {s}")).into()),
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price_cents: i64,
    /// Unit of sale, e.g. `kg`, `liters`, `pieces`
    pub unit: String,
    pub sku: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(skip)]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: ProductCategory,
    pub price_cents: i64,
    pub unit: String,
    #[serde(default)]
    pub sku: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price_cents: i64, unit: impl Into<String>) -> Self {
        Self {
            id: ProductId::new_random(),
            name: name.into(),
            description: None,
            category: ProductCategory::default(),
            price_cents,
            unit: unit.into(),
            sku: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: ProductCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "Product name is required".to_string(),
            ));
        }
        if self.unit.trim().is_empty() {
            return Err(ValidationError::MissingField("Unit is required".to_string()));
        }
        if self.price_cents < 0 {
            return Err(ValidationError::InvalidField(
                "Price cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}
