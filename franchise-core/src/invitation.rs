//! Invitation codes gating signup
//!
//! Registration is closed: a new account can only be created by presenting an
//! invitation code issued by headquarters. Each code carries the role granted
//! to whoever redeems it and an optional usage cap.
//!
//! # Lifecycle
//!
//! 1. An administrator creates a code (optionally capped and with an expiry)
//! 2. A prospective user presents the code at signup
//! 3. The code is checked ([`InvitationCode::check`]) and then redeemed, which
//!    atomically increments `current_uses` at the store
//! 4. Once `current_uses` reaches `max_uses`, further signups are refused

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Role,
    error::{InvitationError, ValidationError},
    id::{generate_prefixed_id, validate_prefixed_id},
};

/// A unique identifier for an invitation code record.
///
/// Prefixed with `inv_`. This is the record id, not the code users type in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvitationCodeId(String);

impl InvitationCodeId {
    pub fn new(id: &str) -> Self {
        InvitationCodeId(id.to_string())
    }

    pub fn new_random() -> Self {
        InvitationCodeId(generate_prefixed_id("inv"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "inv")
    }
}

impl Default for InvitationCodeId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for InvitationCodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InvitationCodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for InvitationCodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InvitationCodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = InvitationCodeId(s.to_string());
        if id.is_valid() {
            Ok(id)
        } else {
            Err(ValidationError::InvalidField(format!(
                "Invalid invitation code ID format: expected 'inv_' prefix, got '{s}'"
            ))
            .into())
        }
    }
}

/// A stored invitation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationCode {
    pub id: InvitationCodeId,
    /// The code presented at signup; unique, matched exactly
    pub code: String,
    pub description: Option<String>,
    /// `None` means unlimited uses
    pub max_uses: Option<u32>,
    pub current_uses: u32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    /// Role granted to accounts created with this code
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvitationCode {
    /// Check whether this code can be redeemed at `now`.
    ///
    /// Checks run in a fixed order and the first failure wins: deactivated,
    /// then expired, then exhausted.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), InvitationError> {
        if !self.is_active {
            return Err(InvitationError::Deactivated);
        }

        if self.expires_at.is_some_and(|expires_at| expires_at < now) {
            return Err(InvitationError::Expired);
        }

        if self.is_exhausted() {
            return Err(InvitationError::Exhausted);
        }

        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses
            .is_some_and(|max_uses| self.current_uses >= max_uses)
    }

    /// Uses left before the cap, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.max_uses
            .map(|max_uses| max_uses.saturating_sub(self.current_uses))
    }
}

/// Data required to create an invitation code.
#[derive(Debug, Clone)]
pub struct NewInvitationCode {
    pub id: InvitationCodeId,
    pub code: String,
    pub description: Option<String>,
    pub max_uses: Option<u32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub role: Role,
    pub is_active: bool,
}

impl NewInvitationCode {
    pub fn builder() -> NewInvitationCodeBuilder {
        NewInvitationCodeBuilder::default()
    }
}

#[derive(Default)]
pub struct NewInvitationCodeBuilder {
    id: Option<InvitationCodeId>,
    code: Option<String>,
    description: Option<String>,
    max_uses: Option<u32>,
    expires_at: Option<DateTime<Utc>>,
    role: Option<Role>,
    is_active: Option<bool>,
}

impl NewInvitationCodeBuilder {
    pub fn id(mut self, id: InvitationCodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn build(self) -> Result<NewInvitationCode, Error> {
        use crate::error::utilities::RequiredFieldExt;

        let code = self.code.require_field("Invitation code")?;
        if code.trim().is_empty() {
            return Err(
                ValidationError::MissingField("Invitation code is required".to_string()).into(),
            );
        }

        Ok(NewInvitationCode {
            id: self.id.unwrap_or_default(),
            code,
            description: self.description,
            max_uses: self.max_uses,
            expires_at: self.expires_at,
            role: self.role.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}
