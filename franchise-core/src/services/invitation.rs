//! Invitation code validation and redemption.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    Error, InvitationCode, InvitationCodeId, NewInvitationCode,
    error::{InvitationError, ValidationError},
    repositories::InvitationCodeRepository,
};

/// Service for checking and consuming invitation codes.
pub struct InvitationCodeService<I: InvitationCodeRepository> {
    repository: Arc<I>,
}

impl<I: InvitationCodeRepository> Clone for InvitationCodeService<I> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<I: InvitationCodeRepository> InvitationCodeService<I> {
    pub fn new(repository: Arc<I>) -> Self {
        Self { repository }
    }

    /// Look up `code` and check that it can be redeemed now.
    ///
    /// Rejections come back as [`Error::Invitation`]; anything else is a
    /// storage failure.
    pub async fn validate(&self, code: &str) -> Result<InvitationCode, Error> {
        let invitation = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or(InvitationError::NotFound)?;

        invitation.check(Utc::now())?;

        Ok(invitation)
    }

    /// Take one use of a validated code.
    ///
    /// Fails with [`InvitationError::Exhausted`] if a concurrent signup took
    /// the last use first.
    pub async fn redeem(&self, invitation: &InvitationCode) -> Result<(), Error> {
        if self.repository.redeem(&invitation.id).await? {
            Ok(())
        } else {
            tracing::warn!(
                invitation_code_id = %invitation.id,
                "Invitation code had no uses left at redemption"
            );
            Err(InvitationError::Exhausted.into())
        }
    }

    /// Return a use taken by [`redeem`](Self::redeem).
    pub async fn release(&self, id: &InvitationCodeId) -> Result<(), Error> {
        self.repository.release(id).await
    }

    pub async fn create(&self, code: NewInvitationCode) -> Result<InvitationCode, Error> {
        if code.max_uses == Some(0) {
            return Err(ValidationError::InvalidField(
                "Maximum uses must be at least 1".to_string(),
            )
            .into());
        }

        let created = self.repository.create(code).await?;
        tracing::info!(
            invitation_code_id = %created.id,
            role = %created.role,
            max_uses = ?created.max_uses,
            "Invitation code created"
        );
        Ok(created)
    }

    pub async fn deactivate(&self, id: &InvitationCodeId) -> Result<(), Error> {
        self.repository.set_active(id, false).await
    }

    pub async fn find_by_id(&self, id: &InvitationCodeId) -> Result<Option<InvitationCode>, Error> {
        self.repository.find_by_id(id).await
    }
}
