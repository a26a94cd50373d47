//! Per-branch stock levels
//!
//! Each branch holds at most one inventory row per product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BranchId, ProductId, ValidationError, id::prefixed_id};

prefixed_id!(
    /// A unique identifier for an inventory row, prefixed with `stk_`.
    InventoryId,
    "stk",
    "inventory"
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryId,
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub quantity: f64,
    /// Stock at or below this level is reported as low
    pub min_threshold: Option<f64>,
    /// Last time the quantity went up
    pub last_restock_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.min_threshold
            .is_some_and(|threshold| self.quantity <= threshold)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    #[serde(skip)]
    pub id: InventoryId,
    pub branch_id: BranchId,
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub min_threshold: Option<f64>,
}

impl NewInventoryItem {
    pub fn new(branch_id: BranchId, product_id: ProductId, quantity: f64) -> Self {
        Self {
            id: InventoryId::new_random(),
            branch_id,
            product_id,
            quantity,
            min_threshold: None,
        }
    }

    pub fn with_min_threshold(mut self, min_threshold: f64) -> Self {
        self.min_threshold = Some(min_threshold);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_quantity(self.quantity)?;
        if let Some(threshold) = self.min_threshold {
            validate_quantity(threshold)?;
        }
        Ok(())
    }
}

/// Stock quantities are finite and never negative.
pub fn validate_quantity(quantity: f64) -> Result<(), ValidationError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(ValidationError::InvalidField(
            "Quantity must be zero or more".to_string(),
        ));
    }
    Ok(())
}
