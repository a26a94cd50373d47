//! Recorded sales
//!
//! Amounts are whole centavos. The total, discount and final amount are
//! computed once from quantity, unit price and discount percent when the
//! sale is recorded, then stored as-is.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, BranchId, Error, ProductId, ValidationError, id::prefixed_id};

prefixed_id!(
    /// A unique identifier for a sale, prefixed with `sal_`.
    SaleId,
    "sal",
    "sale"
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Gcash,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Gcash => "gcash",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "gcash" => Ok(PaymentMethod::Gcash),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(ValidationError::InvalidField(format!("Invalid payment method: {s}")).into()),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub discount_percent: f64,
    pub discount_amount_cents: i64,
    pub final_amount_cents: i64,
    pub recorded_by: AccountId,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
    pub sale_date: DateTime<Utc>,
}

/// Amounts derived from a sale's quantity, price and discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleAmounts {
    pub total_price_cents: i64,
    pub discount_amount_cents: i64,
    pub final_amount_cents: i64,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub id: SaleId,
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub discount_percent: f64,
    pub recorded_by: AccountId,
    pub payment_method: PaymentMethod,
    pub transaction_reference: Option<String>,
}

impl NewSale {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.quantity.is_finite() || self.quantity <= 0.0 {
            return Err(ValidationError::InvalidField(
                "Quantity must be greater than zero".to_string(),
            ));
        }
        if self.unit_price_cents < 0 {
            return Err(ValidationError::InvalidField(
                "Unit price cannot be negative".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.discount_percent) {
            return Err(ValidationError::InvalidField(
                "Discount must be between 0 and 100 percent".to_string(),
            ));
        }
        Ok(())
    }

    /// Amounts rounded to the nearest centavo.
    pub fn amounts(&self) -> SaleAmounts {
        let total = (self.quantity * self.unit_price_cents as f64).round() as i64;
        let discount = (total as f64 * self.discount_percent / 100.0).round() as i64;

        SaleAmounts {
            total_price_cents: total,
            discount_amount_cents: discount,
            final_amount_cents: total - discount,
        }
    }
}

/// Which sales to list. Every bound is optional; `until` is exclusive.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub branch_id: Option<BranchId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl SaleFilter {
    pub fn for_branch(branch_id: BranchId) -> Self {
        Self {
            branch_id: Some(branch_id),
            ..Default::default()
        }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(quantity: f64, unit_price_cents: i64, discount_percent: f64) -> NewSale {
        NewSale {
            id: SaleId::new_random(),
            branch_id: BranchId::new_random(),
            product_id: ProductId::new_random(),
            quantity,
            unit_price_cents,
            discount_percent,
            recorded_by: AccountId::new_random(),
            payment_method: PaymentMethod::default(),
            transaction_reference: None,
        }
    }

    #[test]
    fn test_amounts_without_discount() {
        let amounts = sale(3.0, 8_500, 0.0).amounts();
        assert_eq!(amounts.total_price_cents, 25_500);
        assert_eq!(amounts.discount_amount_cents, 0);
        assert_eq!(amounts.final_amount_cents, 25_500);
    }

    #[test]
    fn test_amounts_round_to_centavo() {
        // 2.5 kg at 199.99 is 499.975, a 12.5% discount on that is 62.50
        let amounts = sale(2.5, 19_999, 12.5).amounts();
        assert_eq!(amounts.total_price_cents, 49_998);
        assert_eq!(amounts.discount_amount_cents, 6_250);
        assert_eq!(amounts.final_amount_cents, 43_748);
    }

    #[test]
    fn test_sale_validation() {
        assert!(sale(1.0, 100, 0.0).validate().is_ok());
        assert!(sale(1.0, 100, 100.0).validate().is_ok());
        assert!(sale(0.0, 100, 0.0).validate().is_err());
        assert!(sale(1.0, -5, 0.0).validate().is_err());
        assert!(sale(1.0, 100, 100.5).validate().is_err());
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Gcash).unwrap(),
            r#""gcash""#
        );
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
    }
}
