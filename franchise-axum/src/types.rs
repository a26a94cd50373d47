use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use franchise::{AccountView, BranchId, BranchStatus, SaleFilter};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvitationCodeQuery {
    pub code: Option<String>,
}

/// Body of `GET /auth/invitation-code/validate`.
///
/// A missing code is reported through `error`; a present code always yields
/// `valid` and a `message`, even when the code cannot be used.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationCodeCheck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvitationCodeCheck {
    pub const VALID: &'static str = "Invitation code is valid";
    pub const MISSING: &'static str = "Invitation code is required";

    pub fn valid() -> Self {
        Self {
            success: true,
            valid: Some(true),
            message: Some(Self::VALID.to_string()),
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            success: true,
            valid: Some(false),
            message: Some(reason.into()),
            error: None,
        }
    }

    pub fn missing() -> Self {
        Self {
            success: false,
            valid: None,
            message: None,
            error: Some(Self::MISSING.to_string()),
        }
    }
}

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub type AccountResponse = DataResponse<AccountView>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct BranchStatusRequest {
    pub status: BranchStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActiveRequest {
    pub is_active: bool,
}

/// `branchId: null` detaches the account from its branch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBranchRequest {
    pub branch_id: Option<BranchId>,
}

/// Query of `GET /sales`.
///
/// Dates are RFC 3339 timestamps or plain `YYYY-MM-DD` days. A plain end
/// date includes the whole day.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub branch_id: Option<BranchId>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SalesQuery {
    pub fn into_filter(self) -> Result<SaleFilter, ApiError> {
        let since = self
            .start_date
            .as_deref()
            .map(|value| parse_date_bound(value, false))
            .transpose()?;
        let until = self
            .end_date
            .as_deref()
            .map(|value| parse_date_bound(value, true))
            .transpose()?;

        Ok(SaleFilter {
            branch_id: self.branch_id,
            since,
            until,
        })
    }
}

fn parse_date_bound(value: &str, end_of_range: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {value}")))?;
    let start = day.and_time(NaiveTime::MIN).and_utc();

    Ok(if end_of_range {
        start + Duration::days(1)
    } else {
        start
    })
}
