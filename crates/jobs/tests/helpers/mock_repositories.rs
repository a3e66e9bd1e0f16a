#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use spacesweep_application::ports::{
    ChildStream, DeleteReport, SpaceStore, SpaceStream, SweepLock,
};
use spacesweep_application::use_cases::{
    CleanSpaceUseCase, LockSettings, RunSweepUseCase, SweepOptions,
};
use spacesweep_domain::{ChildKind, ChildRecord, DomainError, SpaceId, TtlPolicy};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Store with one space whose presence documents can be refilled between
/// runs; counts every full space listing.
pub struct MockSpaceStore {
    presence: Arc<RwLock<BTreeMap<String, i64>>>,
    user_count: Arc<RwLock<u64>>,
    list_calls: Arc<AtomicU64>,
}

impl MockSpaceStore {
    pub fn new() -> Self {
        Self {
            presence: Arc::new(RwLock::new(BTreeMap::new())),
            user_count: Arc::new(RwLock::new(0)),
            list_calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Adds a presence document last updated `minutes` ago.
    pub async fn add_presence(&self, id: &str, minutes: i64) {
        self.presence.write().await.insert(id.to_string(), minutes);
    }

    pub async fn presence_count(&self) -> usize {
        self.presence.read().await.len()
    }

    pub async fn user_count(&self) -> u64 {
        *self.user_count.read().await
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpaceStore for MockSpaceStore {
    fn list_spaces(&self) -> SpaceStream<'_> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        stream::iter(vec![Ok(SpaceId::from("room-1"))]).boxed()
    }

    fn list_children(&self, _space_id: &SpaceId, kind: ChildKind) -> ChildStream<'_> {
        let page = async move {
            let records: Vec<Result<ChildRecord, DomainError>> = match kind {
                ChildKind::Presence => self
                    .presence
                    .read()
                    .await
                    .iter()
                    .map(|(id, minutes)| {
                        Ok(ChildRecord::new(
                            id.clone(),
                            Utc::now() - TimeDelta::minutes(*minutes),
                        ))
                    })
                    .collect(),
                ChildKind::Message => Vec::new(),
            };
            stream::iter(records)
        };
        stream::once(page).flatten().boxed()
    }

    async fn delete_children(
        &self,
        _space_id: &SpaceId,
        kind: ChildKind,
        ids: &[String],
    ) -> Result<DeleteReport, DomainError> {
        let mut report = DeleteReport::default();
        if kind == ChildKind::Presence {
            let mut presence = self.presence.write().await;
            for id in ids {
                presence.remove(id);
            }
        }
        report.record_chunk(ids, Ok(()));
        Ok(report)
    }

    async fn set_user_count(&self, _space_id: &SpaceId, count: u64) -> Result<(), DomainError> {
        *self.user_count.write().await = count;
        Ok(())
    }
}

/// Lock that is always held by someone else.
pub struct BusyLock;

#[async_trait]
impl SweepLock for BusyLock {
    async fn try_acquire(&self, _holder: &str, _ttl: Duration) -> Result<bool, DomainError> {
        Ok(false)
    }

    async fn release(&self, _holder: &str) -> Result<(), DomainError> {
        Ok(())
    }
}

pub fn make_sweep(store: Arc<MockSpaceStore>) -> Arc<RunSweepUseCase> {
    let store: Arc<dyn SpaceStore> = store;
    let cleaner = Arc::new(CleanSpaceUseCase::new(store.clone(), TtlPolicy::default()));
    Arc::new(RunSweepUseCase::new(store, cleaner, SweepOptions::default()))
}

pub fn make_locked_sweep(store: Arc<MockSpaceStore>) -> Arc<RunSweepUseCase> {
    let store: Arc<dyn SpaceStore> = store;
    let cleaner = Arc::new(CleanSpaceUseCase::new(store.clone(), TtlPolicy::default()));
    Arc::new(
        RunSweepUseCase::new(store, cleaner, SweepOptions::default()).with_lock(
            Arc::new(BusyLock),
            LockSettings {
                holder: "test-holder".to_string(),
                ttl: Duration::from_secs(60),
            },
        ),
    )
}
