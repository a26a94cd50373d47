//! Franchise branches
//!
//! A branch is one franchised store. Franchisees and crew are attached to a
//! single branch through [`Account::branch_id`](crate::Account::branch_id)
//! and only see that branch's inventory and sales.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, ValidationError, id::prefixed_id};

prefixed_id!(
    /// A unique identifier for a branch, prefixed with `brn_`.
    BranchId,
    "brn",
    "branch"
);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchStatus {
    #[default]
    Active,
    Inactive,
    /// Signed but not yet trading
    Pending,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Active => "active",
            BranchStatus::Inactive => "inactive",
            BranchStatus::Pending => "pending",
        }
    }
}

impl FromStr for BranchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BranchStatus::Active),
            "inactive" => Ok(BranchStatus::Inactive),
            "pending" => Ok(BranchStatus::Pending),
            _ => Err(ValidationError::InvalidField(format!("Invalid branch status: {s}")).into()),
        }
    }
}

impl std::fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub location: String,
    pub franchisee_name: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub status: BranchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to open a branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    #[serde(skip)]
    pub id: BranchId,
    pub name: String,
    pub location: String,
    pub franchisee_name: String,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: BranchStatus,
}

impl NewBranch {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        franchisee_name: impl Into<String>,
    ) -> Self {
        Self {
            id: BranchId::new_random(),
            name: name.into(),
            location: location.into(),
            franchisee_name: franchisee_name.into(),
            contact_number: None,
            email: None,
            status: BranchStatus::default(),
        }
    }

    pub fn with_contact_number(mut self, contact_number: impl Into<String>) -> Self {
        self.contact_number = Some(contact_number.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: BranchStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "Branch name is required".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "Location is required".to_string(),
            ));
        }
        if self.franchisee_name.trim().is_empty() {
            return Err(ValidationError::MissingField(
                "Franchisee name is required".to_string(),
            ));
        }
        if let Some(email) = &self.email {
            crate::validation::validate_email(email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_id() {
        let id = BranchId::new_random();
        assert!(id.as_str().starts_with("brn_"));
        assert!(id.is_valid());
        assert!("prd_abc".parse::<BranchId>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            BranchStatus::Active,
            BranchStatus::Inactive,
            BranchStatus::Pending,
        ] {
            assert_eq!(status.as_str().parse::<BranchStatus>().unwrap(), status);
        }
        assert!("closed".parse::<BranchStatus>().is_err());
    }

    #[test]
    fn test_new_branch_validation() {
        let branch = NewBranch::new("Quezon City", "Tomas Morato Ave", "Maria Santos");
        assert!(branch.validate().is_ok());
        assert_eq!(branch.status, BranchStatus::Active);

        let unnamed = NewBranch::new(" ", "Tomas Morato Ave", "Maria Santos");
        assert_eq!(
            unnamed.validate().unwrap_err().to_string(),
            "Branch name is required"
        );

        let bad_email = NewBranch::new("Makati", "Ayala Ave", "Jose Cruz").with_email("nope");
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_new_branch_from_json_gets_fresh_id() {
        let branch: NewBranch = serde_json::from_str(
            r#"{"name":"Pasig","location":"Kapitolyo","franchiseeName":"Ana Reyes","status":"pending"}"#,
        )
        .unwrap();
        assert!(branch.id.is_valid());
        assert_eq!(branch.status, BranchStatus::Pending);
        assert_eq!(branch.contact_number, None);
    }
}
