//! Repository trait for branch data access.

use async_trait::async_trait;

use crate::{Branch, BranchId, BranchStatus, Error, NewBranch};

#[async_trait]
pub trait BranchRepository: Send + Sync + 'static {
    async fn create(&self, branch: NewBranch) -> Result<Branch, Error>;

    async fn find_by_id(&self, id: &BranchId) -> Result<Option<Branch>, Error>;

    /// All branches ordered by name.
    async fn list(&self) -> Result<Vec<Branch>, Error>;

    /// Fails with [`StorageError::NotFound`](crate::StorageError::NotFound)
    /// for an unknown id.
    async fn set_status(&self, id: &BranchId, status: BranchStatus) -> Result<Branch, Error>;
}
