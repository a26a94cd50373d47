//! Repository trait for invitation code data access.

use async_trait::async_trait;

use crate::{Error, InvitationCode, InvitationCodeId, NewInvitationCode};

/// Repository for invitation code data access.
#[async_trait]
pub trait InvitationCodeRepository: Send + Sync + 'static {
    /// Store a new invitation code. Codes are unique.
    async fn create(&self, code: NewInvitationCode) -> Result<InvitationCode, Error>;

    async fn find_by_id(&self, id: &InvitationCodeId) -> Result<Option<InvitationCode>, Error>;

    /// Find a code by its exact (case-sensitive) text.
    async fn find_by_code(&self, code: &str) -> Result<Option<InvitationCode>, Error>;

    /// Consume one use of the code.
    ///
    /// Must be a single conditional update: the use is only taken while the
    /// code is active and below its cap. Returns `false` when no use was
    /// available.
    async fn redeem(&self, id: &InvitationCodeId) -> Result<bool, Error>;

    /// Give back a use taken by [`redeem`](Self::redeem).
    async fn release(&self, id: &InvitationCodeId) -> Result<(), Error>;

    /// Activate or deactivate a code.
    async fn set_active(&self, id: &InvitationCodeId, is_active: bool) -> Result<(), Error>;
}
