#![allow(dead_code)]
#![allow(unused_imports)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use futures::stream::{self, StreamExt};
use spacesweep_application::ports::{
    ChildStream, DeleteReport, SpaceStore, SpaceStream, SweepLock,
};
use spacesweep_domain::{ChildKind, ChildRecord, ChildTimestamp, DomainError, SpaceId};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const BATCH_CAP: usize = 500;

pub fn minutes_ago(minutes: i64) -> ChildTimestamp {
    ChildTimestamp::At(Utc::now() - TimeDelta::minutes(minutes))
}

pub fn hours_ago(hours: i64) -> ChildTimestamp {
    ChildTimestamp::At(Utc::now() - TimeDelta::hours(hours))
}

#[derive(Debug, Clone, Default)]
pub struct MockSpace {
    pub current_user_count: u64,
    pub presence: BTreeMap<String, ChildTimestamp>,
    pub messages: BTreeMap<String, ChildTimestamp>,
}

impl MockSpace {
    fn collection(&self, kind: ChildKind) -> &BTreeMap<String, ChildTimestamp> {
        match kind {
            ChildKind::Presence => &self.presence,
            ChildKind::Message => &self.messages,
        }
    }

    fn collection_mut(&mut self, kind: ChildKind) -> &mut BTreeMap<String, ChildTimestamp> {
        match kind {
            ChildKind::Presence => &mut self.presence,
            ChildKind::Message => &mut self.messages,
        }
    }
}

/// In-memory document store with failure injection.
pub struct MockSpaceStore {
    spaces: Arc<RwLock<BTreeMap<String, MockSpace>>>,
    batch_size: usize,
    fail_spaces_after: Arc<RwLock<Option<usize>>>,
    failing_lists: Arc<RwLock<HashSet<(String, ChildKind)>>>,
    partial_lists: Arc<RwLock<HashSet<(String, ChildKind)>>>,
    failing_deletes: Arc<RwLock<HashSet<(String, ChildKind)>>>,
    failing_delete_ids: Arc<RwLock<HashSet<String>>>,
    failing_writes: Arc<RwLock<HashSet<String>>>,
    vanishing_spaces: Arc<RwLock<HashSet<String>>>,
    panicking_spaces: Arc<RwLock<HashSet<String>>>,
    list_delay: Arc<RwLock<Option<Duration>>>,
    delete_calls: Arc<AtomicU64>,
    delete_chunks: Arc<AtomicU64>,
    write_calls: Arc<AtomicU64>,
    active_presence_listings: Arc<AtomicUsize>,
    max_presence_listings: Arc<AtomicUsize>,
}

impl MockSpaceStore {
    pub fn new() -> Self {
        Self {
            spaces: Arc::new(RwLock::new(BTreeMap::new())),
            batch_size: BATCH_CAP,
            fail_spaces_after: Arc::new(RwLock::new(None)),
            failing_lists: Arc::new(RwLock::new(HashSet::new())),
            partial_lists: Arc::new(RwLock::new(HashSet::new())),
            failing_deletes: Arc::new(RwLock::new(HashSet::new())),
            failing_delete_ids: Arc::new(RwLock::new(HashSet::new())),
            failing_writes: Arc::new(RwLock::new(HashSet::new())),
            vanishing_spaces: Arc::new(RwLock::new(HashSet::new())),
            panicking_spaces: Arc::new(RwLock::new(HashSet::new())),
            list_delay: Arc::new(RwLock::new(None)),
            delete_calls: Arc::new(AtomicU64::new(0)),
            delete_chunks: Arc::new(AtomicU64::new(0)),
            write_calls: Arc::new(AtomicU64::new(0)),
            active_presence_listings: Arc::new(AtomicUsize::new(0)),
            max_presence_listings: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub async fn add_space(&self, id: &str) {
        self.spaces
            .write()
            .await
            .entry(id.to_string())
            .or_default();
    }

    pub async fn add_space_with_count(&self, id: &str, count: u64) {
        self.spaces
            .write()
            .await
            .entry(id.to_string())
            .or_default()
            .current_user_count = count;
    }

    pub async fn add_presence(&self, space: &str, user: &str, last_update: ChildTimestamp) {
        self.add_child(space, ChildKind::Presence, user, last_update)
            .await;
    }

    pub async fn add_message(&self, space: &str, message: &str, timestamp: ChildTimestamp) {
        self.add_child(space, ChildKind::Message, message, timestamp)
            .await;
    }

    async fn add_child(&self, space: &str, kind: ChildKind, id: &str, ts: ChildTimestamp) {
        self.spaces
            .write()
            .await
            .entry(space.to_string())
            .or_default()
            .collection_mut(kind)
            .insert(id.to_string(), ts);
    }

    pub async fn presence_ids(&self, space: &str) -> Vec<String> {
        self.child_ids(space, ChildKind::Presence).await
    }

    pub async fn message_ids(&self, space: &str) -> Vec<String> {
        self.child_ids(space, ChildKind::Message).await
    }

    async fn child_ids(&self, space: &str, kind: ChildKind) -> Vec<String> {
        self.spaces
            .read()
            .await
            .get(space)
            .map(|s| s.collection(kind).keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn user_count(&self, space: &str) -> Option<u64> {
        self.spaces
            .read()
            .await
            .get(space)
            .map(|s| s.current_user_count)
    }

    pub async fn space_exists(&self, space: &str) -> bool {
        self.spaces.read().await.contains_key(space)
    }

    pub async fn fail_spaces_after(&self, n: usize) {
        *self.fail_spaces_after.write().await = Some(n);
    }

    pub async fn fail_list(&self, space: &str, kind: ChildKind) {
        self.failing_lists
            .write()
            .await
            .insert((space.to_string(), kind));
    }

    /// Yield the first record of the collection, then fail.
    pub async fn fail_list_after_first(&self, space: &str, kind: ChildKind) {
        self.partial_lists
            .write()
            .await
            .insert((space.to_string(), kind));
    }

    pub async fn fail_deletes(&self, space: &str, kind: ChildKind) {
        self.failing_deletes
            .write()
            .await
            .insert((space.to_string(), kind));
    }

    /// Fail every chunk containing this id.
    pub async fn fail_delete_of(&self, id: &str) {
        self.failing_delete_ids.write().await.insert(id.to_string());
    }

    pub async fn fail_writes(&self, space: &str) {
        self.failing_writes.write().await.insert(space.to_string());
    }

    /// The space disappears right before its count is written.
    pub async fn vanish_before_write(&self, space: &str) {
        self.vanishing_spaces
            .write()
            .await
            .insert(space.to_string());
    }

    /// Listing this space's children panics the worker.
    pub async fn panic_on_list(&self, space: &str) {
        self.panicking_spaces
            .write()
            .await
            .insert(space.to_string());
    }

    pub async fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.write().await = Some(delay);
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn delete_chunks(&self) -> u64 {
        self.delete_chunks.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_spaces(&self) -> usize {
        self.max_presence_listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpaceStore for MockSpaceStore {
    fn list_spaces(&self) -> SpaceStream<'_> {
        let snapshot = async move {
            let ids: Vec<String> = self.spaces.read().await.keys().cloned().collect();
            let fail_after = *self.fail_spaces_after.read().await;

            let mut items: Vec<Result<SpaceId, DomainError>> = Vec::new();
            for (i, id) in ids.into_iter().enumerate() {
                if fail_after == Some(i) {
                    items.push(Err(DomainError::ReadError("spaces listing failed".to_string())));
                    return stream::iter(items);
                }
                items.push(Ok(SpaceId::from(id)));
            }
            if let Some(n) = fail_after {
                if n >= items.len() {
                    items.push(Err(DomainError::ReadError("spaces listing failed".to_string())));
                }
            }
            stream::iter(items)
        };
        stream::once(snapshot).flatten().boxed()
    }

    fn list_children(&self, space_id: &SpaceId, kind: ChildKind) -> ChildStream<'_> {
        let space = space_id.as_str().to_string();
        let page = async move {
            let delay = *self.list_delay.read().await;
            let tracked = kind == ChildKind::Presence;
            if tracked {
                let active = self.active_presence_listings.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_presence_listings.fetch_max(active, Ordering::SeqCst);
            }
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if tracked {
                self.active_presence_listings.fetch_sub(1, Ordering::SeqCst);
            }

            if self.panicking_spaces.read().await.contains(&space) {
                panic!("listing {} exploded", space);
            }

            let key = (space.clone(), kind);
            if self.failing_lists.read().await.contains(&key) {
                return stream::iter(vec![Err(DomainError::ReadError(format!(
                    "{} listing failed",
                    kind
                )))]);
            }

            let records: Vec<ChildRecord> = self
                .spaces
                .read()
                .await
                .get(&space)
                .map(|s| {
                    s.collection(kind)
                        .iter()
                        .map(|(id, ts)| ChildRecord::new(id.clone(), *ts))
                        .collect()
                })
                .unwrap_or_default();

            let mut items: Vec<Result<ChildRecord, DomainError>> =
                records.into_iter().map(Ok).collect();
            if self.partial_lists.read().await.contains(&key) {
                items.truncate(1);
                items.push(Err(DomainError::ReadError(format!(
                    "{} page 2 failed",
                    kind
                ))));
            }
            stream::iter(items)
        };
        stream::once(page).flatten().boxed()
    }

    async fn delete_children(
        &self,
        space_id: &SpaceId,
        kind: ChildKind,
        ids: &[String],
    ) -> Result<DeleteReport, DomainError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let key = (space_id.as_str().to_string(), kind);
        if self.failing_deletes.read().await.contains(&key) {
            return Err(DomainError::DeleteError("batch commit rejected".to_string()));
        }

        let failing_ids = self.failing_delete_ids.read().await.clone();
        let mut report = DeleteReport::default();
        for chunk in ids.chunks(self.batch_size) {
            self.delete_chunks.fetch_add(1, Ordering::SeqCst);
            if chunk.iter().any(|id| failing_ids.contains(id)) {
                report.record_chunk(
                    chunk,
                    Err(DomainError::DeleteError("chunk commit rejected".to_string())),
                );
                continue;
            }
            if let Some(space) = self.spaces.write().await.get_mut(space_id.as_str()) {
                let collection = space.collection_mut(kind);
                for id in chunk {
                    collection.remove(id);
                }
            }
            report.record_chunk(chunk, Ok(()));
        }
        Ok(report)
    }

    async fn set_user_count(&self, space_id: &SpaceId, count: u64) -> Result<(), DomainError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let id = space_id.as_str();
        if self.failing_writes.read().await.contains(id) {
            return Err(DomainError::WriteError("update rejected".to_string()));
        }
        if self.vanishing_spaces.read().await.contains(id) {
            self.spaces.write().await.remove(id);
        }
        match self.spaces.write().await.get_mut(id) {
            Some(space) => {
                space.current_user_count = count;
                Ok(())
            }
            None => Err(DomainError::SpaceRemoved(id.to_string())),
        }
    }
}

pub struct MockSweepLock {
    holder: Arc<RwLock<Option<String>>>,
    should_fail: AtomicBool,
    acquire_calls: AtomicU64,
    release_calls: AtomicU64,
}

impl MockSweepLock {
    pub fn new() -> Self {
        Self {
            holder: Arc::new(RwLock::new(None)),
            should_fail: AtomicBool::new(false),
            acquire_calls: AtomicU64::new(0),
            release_calls: AtomicU64::new(0),
        }
    }

    pub async fn held_by(holder: &str) -> Self {
        let lock = Self::new();
        *lock.holder.write().await = Some(holder.to_string());
        lock
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub async fn current_holder(&self) -> Option<String> {
        self.holder.read().await.clone()
    }

    pub fn acquire_calls(&self) -> u64 {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> u64 {
        self.release_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SweepLock for MockSweepLock {
    async fn try_acquire(&self, holder: &str, _ttl: Duration) -> Result<bool, DomainError> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DomainError::LockError("lock store unavailable".to_string()));
        }
        let mut current = self.holder.write().await;
        if current.is_some() {
            return Ok(false);
        }
        *current = Some(holder.to_string());
        Ok(true)
    }

    async fn release(&self, holder: &str) -> Result<(), DomainError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let mut current = self.holder.write().await;
        if current.as_deref() == Some(holder) {
            *current = None;
        }
        Ok(())
    }
}
