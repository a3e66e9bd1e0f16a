use crate::ports::SpaceStore;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use spacesweep_domain::{
    ChildKind, ChildRecord, DomainError, SpaceFailure, SpaceId, SpaceOutcome, SpaceStatus,
    SweepStep, TtlPolicy,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Evicts stale children of one space and rewrites its `currentUserCount`.
///
/// The presence chain (evict, recount, write) and the message eviction touch
/// disjoint sub-collections and run side by side, so a failure in one never
/// stops the other.
pub struct CleanSpaceUseCase {
    store: Arc<dyn SpaceStore>,
    policy: TtlPolicy,
}

/// What one eviction pass over a sub-collection achieved.
#[derive(Debug, Default)]
struct EvictionPass {
    evicted: u64,
    live: u64,
    /// Stale documents the store refused to delete; they still exist.
    undeleted: u64,
    listing_complete: bool,
    failure: Option<SpaceFailure>,
}

impl EvictionPass {
    fn remaining(&self) -> u64 {
        self.live + self.undeleted
    }
}

struct PresenceResult {
    pass: EvictionPass,
    user_count: Option<u64>,
    write_failure: Option<SpaceFailure>,
    removed: bool,
}

impl CleanSpaceUseCase {
    pub fn new(store: Arc<dyn SpaceStore>, policy: TtlPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    #[instrument(skip(self, space_id, now), fields(space_id = %space_id))]
    pub async fn execute(&self, space_id: &SpaceId, now: DateTime<Utc>) -> SpaceOutcome {
        let (presence, messages) = tokio::join!(
            self.clean_presence(space_id, now),
            self.evict(space_id, ChildKind::Message, now),
        );

        let first_failure = presence
            .pass
            .failure
            .or(presence.write_failure)
            .or(messages.failure);

        let status = match first_failure {
            Some(failure) => SpaceStatus::Failed(failure),
            None if presence.removed => SpaceStatus::Removed,
            None => SpaceStatus::Cleaned,
        };

        SpaceOutcome {
            space_id: space_id.clone(),
            presence_evicted: presence.pass.evicted,
            messages_evicted: messages.evicted,
            user_count: presence.user_count,
            status,
        }
    }

    async fn clean_presence(&self, space_id: &SpaceId, now: DateTime<Utc>) -> PresenceResult {
        let pass = self.evict(space_id, ChildKind::Presence, now).await;
        let mut result = PresenceResult {
            pass,
            user_count: None,
            write_failure: None,
            removed: false,
        };

        // A broken listing leaves the real count unknown; keep the old value.
        if !result.pass.listing_complete {
            return result;
        }

        let count = result.pass.remaining();
        match self.store.set_user_count(space_id, count).await {
            Ok(()) => {
                debug!(count, "currentUserCount updated");
                result.user_count = Some(count);
            }
            Err(DomainError::SpaceRemoved(_)) => {
                debug!("Space removed during sweep, skipping count update");
                result.removed = true;
            }
            Err(e) => {
                warn!(error = %e, count, "Failed to update currentUserCount");
                result.write_failure = Some(SpaceFailure::at(SweepStep::WriteUserCount, e.to_string()));
            }
        }

        result
    }

    async fn evict(&self, space_id: &SpaceId, kind: ChildKind, now: DateTime<Utc>) -> EvictionPass {
        let (list_step, delete_step) = match kind {
            ChildKind::Presence => (SweepStep::ListPresence, SweepStep::DeletePresence),
            ChildKind::Message => (SweepStep::ListMessages, SweepStep::DeleteMessages),
        };

        let mut pass = EvictionPass {
            listing_complete: true,
            ..EvictionPass::default()
        };

        let mut records: Vec<ChildRecord> = Vec::new();
        let mut children = self.store.list_children(space_id, kind);
        while let Some(item) = children.next().await {
            match item {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(error = %e, collection = %kind, listed = records.len(), "Listing failed part way");
                    pass.listing_complete = false;
                    pass.failure = Some(SpaceFailure::at(list_step, e.to_string()));
                    break;
                }
            }
        }
        drop(children);

        // Stale records already read are still evicted after a broken listing.
        let partition = self.policy.partition(kind, &records, now);
        pass.live = partition.live.len() as u64;
        if partition.stale.is_empty() {
            return pass;
        }

        match self.store.delete_children(space_id, kind, &partition.stale).await {
            Ok(report) => {
                pass.evicted = report.deleted;
                pass.undeleted = report.failed_ids.len() as u64;
                if !report.is_complete() {
                    let message = report
                        .first_error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| format!("{} documents not deleted", pass.undeleted));
                    warn!(collection = %kind, failed = pass.undeleted, error = %message, "Delete partially failed");
                    pass.failure
                        .get_or_insert_with(|| SpaceFailure::at(delete_step, message));
                }
            }
            Err(e) => {
                warn!(collection = %kind, error = %e, "Delete failed");
                pass.undeleted = partition.stale.len() as u64;
                pass.failure
                    .get_or_insert_with(|| SpaceFailure::at(delete_step, e.to_string()));
            }
        }

        debug!(
            collection = %kind,
            evicted = pass.evicted,
            live = pass.live,
            "Eviction pass finished"
        );
        pass
    }
}
