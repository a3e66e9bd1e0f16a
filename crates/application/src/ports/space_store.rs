use async_trait::async_trait;
use futures::stream::BoxStream;
use spacesweep_domain::{ChildKind, ChildRecord, DomainError, SpaceId};

pub type SpaceStream<'a> = BoxStream<'a, Result<SpaceId, DomainError>>;
pub type ChildStream<'a> = BoxStream<'a, Result<ChildRecord, DomainError>>;

/// Result of a best-effort batched delete.
///
/// Every id handed to [`SpaceStore::delete_children`] ends up either counted
/// in `deleted` or listed in `failed_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: u64,
    pub failed_ids: Vec<String>,
    pub first_error: Option<DomainError>,
}

impl DeleteReport {
    pub fn record_chunk(&mut self, chunk: &[String], result: Result<(), DomainError>) {
        match result {
            Ok(()) => self.deleted += chunk.len() as u64,
            Err(e) => {
                self.failed_ids.extend(chunk.iter().cloned());
                self.first_error.get_or_insert(e);
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed_ids.is_empty()
    }
}

/// I/O surface of the hierarchical document store.
///
/// Listings are lazy and restartable: every call starts a fresh enumeration,
/// and records from pages already fetched are yielded before the error of a
/// later page.
#[async_trait]
pub trait SpaceStore: Send + Sync {
    /// Enumerate every space id. No ordering guarantee.
    fn list_spaces(&self) -> SpaceStream<'_>;

    /// Enumerate the documents of one sub-collection of a space.
    fn list_children(&self, space_id: &SpaceId, kind: ChildKind) -> ChildStream<'_>;

    /// Delete the named documents in chunks no larger than the store's batch
    /// cap, continuing past a failed chunk. Ids that no longer exist count as
    /// deleted.
    async fn delete_children(
        &self,
        space_id: &SpaceId,
        kind: ChildKind,
        ids: &[String],
    ) -> Result<DeleteReport, DomainError>;

    /// Atomically set `currentUserCount` on a space.
    ///
    /// Returns `DomainError::SpaceRemoved` when the space no longer exists.
    async fn set_user_count(&self, space_id: &SpaceId, count: u64) -> Result<(), DomainError>;
}
