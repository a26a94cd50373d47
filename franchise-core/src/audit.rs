//! Audit trail of security-relevant events
//!
//! Every signup and login decision appends one entry. Entries are never
//! updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AccountId;

/// Action tags written to the audit log.
pub mod actions {
    pub const SIGNUP_INVALID_INVITATION_CODE: &str = "SIGNUP_INVALID_INVITATION_CODE";
    pub const SIGNUP_EMAIL_EXISTS: &str = "SIGNUP_EMAIL_EXISTS";
    pub const USER_SIGNUP_SUCCESS: &str = "USER_SIGNUP_SUCCESS";
    pub const LOGIN_USER_NOT_FOUND: &str = "LOGIN_USER_NOT_FOUND";
    pub const LOGIN_ACCOUNT_INACTIVE: &str = "LOGIN_ACCOUNT_INACTIVE";
    pub const LOGIN_ACCOUNT_LOCKED: &str = "LOGIN_ACCOUNT_LOCKED";
    pub const LOGIN_INVALID_PASSWORD: &str = "LOGIN_INVALID_PASSWORD";
    pub const LOGIN_SUCCESS: &str = "LOGIN_SUCCESS";
}

/// Entity type tags.
pub mod entities {
    pub const USER: &str = "user";
    pub const INVITATION_CODE: &str = "invitation_code";
}

/// A persisted audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    /// The acting account, absent for anonymous attempts
    pub account_id: Option<AccountId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An audit entry waiting to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub account_id: Option<AccountId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            account_id: None,
            action: action.into(),
            entity_type: None,
            entity_id: None,
            details: Value::Object(Default::default()),
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, account_id: &AccountId) -> Self {
        self.account_id = Some(account_id.clone());
        self
    }

    pub fn entity(mut self, entity_type: &str, entity_id: Option<String>) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self.entity_id = entity_id;
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn client(mut self, client: &ClientContext) -> Self {
        self.ip_address = client.ip_address.clone();
        self.user_agent = client.user_agent.clone();
        self
    }
}

/// Where a request came from, as recorded in the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}
