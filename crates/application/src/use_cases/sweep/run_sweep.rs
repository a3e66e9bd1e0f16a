use super::clean_space::CleanSpaceUseCase;
use crate::ports::{SpaceStore, SweepLock};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use spacesweep_domain::config::SweepConfig;
use spacesweep_domain::{
    ChildKind, DomainError, SpaceId, SpaceOutcome, SpaceStatus, SweepPhase, SweepSummary,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id as TaskId, JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

const DEFAULT_MAX_CONCURRENCY: usize = 16;
const DEFAULT_DEADLINE_SECS: u64 = 540;
const DEFAULT_DRAIN_MARGIN_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub max_concurrency: usize,
    pub deadline: Duration,
    pub drain_margin: Duration,
}

impl SweepOptions {
    pub fn from_config(cfg: &SweepConfig) -> Self {
        Self {
            max_concurrency: cfg.max_concurrency.max(1),
            deadline: Duration::from_secs(cfg.deadline_secs),
            drain_margin: Duration::from_secs(cfg.drain_margin_secs),
        }
    }
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            drain_margin: Duration::from_secs(DEFAULT_DRAIN_MARGIN_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockSettings {
    pub holder: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    LockActive,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::LockActive => "lock_active",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SweepRun {
    Finished(SweepSummary),
    Skipped { reason: SkipReason },
}

/// The space listing itself broke; nothing further can be dispatched.
///
/// Work already dispatched was drained and is reported in `partial`.
#[derive(Debug, thiserror::Error)]
#[error("Sweep aborted: {source}")]
pub struct SweepError {
    pub source: DomainError,
    pub partial: SweepSummary,
}

pub struct RunSweepUseCase {
    store: Arc<dyn SpaceStore>,
    cleaner: Arc<CleanSpaceUseCase>,
    lock: Option<(Arc<dyn SweepLock>, LockSettings)>,
    options: SweepOptions,
    /// Running workers, including ones detached at a deadline.
    tracker: TaskTracker,
}

impl RunSweepUseCase {
    pub fn new(
        store: Arc<dyn SpaceStore>,
        cleaner: Arc<CleanSpaceUseCase>,
        options: SweepOptions,
    ) -> Self {
        Self {
            store,
            cleaner,
            lock: None,
            options,
            tracker: TaskTracker::new(),
        }
    }

    pub fn with_lock(mut self, lock: Arc<dyn SweepLock>, settings: LockSettings) -> Self {
        self.lock = Some((lock, settings));
        self
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    /// Workers detached at a deadline that are still running.
    pub fn detached_in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for every detached worker to finish. Call before the runtime
    /// goes away, or abandoned spaces are cut off mid-pass.
    pub async fn wait_for_detached(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            info!(
                in_flight = self.tracker.len(),
                "Waiting for abandoned spaces to finish"
            );
        }
        self.tracker.wait().await;
    }

    /// Entry point for every trigger: takes the overlap lock when one is
    /// configured, sweeps, and releases the lock again.
    pub async fn execute(&self) -> Result<SweepRun, SweepError> {
        let held = match &self.lock {
            Some((lock, settings)) => match lock.try_acquire(&settings.holder, settings.ttl).await {
                Ok(true) => {
                    info!(holder = %settings.holder, "Sweep lock acquired");
                    Some((lock, settings))
                }
                Ok(false) => {
                    info!(holder = %settings.holder, "Sweep lock busy, skipping run");
                    return Ok(SweepRun::Skipped {
                        reason: SkipReason::LockActive,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Sweep lock unavailable, sweeping without it");
                    None
                }
            },
            None => None,
        };

        let result = self.sweep(Utc::now()).await;

        if let Some((lock, settings)) = held {
            match lock.release(&settings.holder).await {
                Ok(()) => info!(holder = %settings.holder, "Sweep lock released"),
                Err(e) => warn!(error = %e, "Failed to release sweep lock"),
            }
        }

        result.map(SweepRun::Finished)
    }

    /// One full pass over every space, judged against a single `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, SweepError> {
        let started = Instant::now();
        let hard_deadline = started + self.options.deadline;
        let dispatch_cutoff = hard_deadline
            .checked_sub(self.options.drain_margin)
            .filter(|cutoff| *cutoff > started)
            .unwrap_or(hard_deadline);

        let mut summary = SweepSummary::new(now);
        let mut phase = SweepPhase::Idle.start();
        info!(
            max_concurrency = self.options.max_concurrency,
            deadline_secs = self.options.deadline.as_secs(),
            presence_ttl_secs = self.cleaner.policy().ttl_for(ChildKind::Presence).num_seconds(),
            message_ttl_secs = self.cleaner.policy().ttl_for(ChildKind::Message).num_seconds(),
            "Sweep started"
        );

        let mut workers: JoinSet<SpaceOutcome> = JoinSet::new();
        let mut in_flight: HashMap<TaskId, SpaceId> = HashMap::new();
        let mut deadline_hit = false;
        let mut fatal: Option<DomainError> = None;

        let mut spaces = self.store.list_spaces();
        'dispatch: loop {
            while workers.len() >= self.options.max_concurrency {
                match timeout_at(dispatch_cutoff, workers.join_next_with_id()).await {
                    Ok(Some(joined)) => collect(joined, &mut in_flight, &mut summary),
                    Ok(None) => break,
                    Err(_) => {
                        deadline_hit = true;
                        break 'dispatch;
                    }
                }
            }

            if Instant::now() >= dispatch_cutoff {
                deadline_hit = true;
                break;
            }

            let next = match timeout_at(dispatch_cutoff, spaces.next()).await {
                Ok(next) => next,
                Err(_) => {
                    deadline_hit = true;
                    break;
                }
            };

            match next {
                Some(Ok(space_id)) => {
                    let cleaner = Arc::clone(&self.cleaner);
                    let task_space = space_id.clone();
                    let handle = workers.spawn(
                        self.tracker
                            .track_future(async move { cleaner.execute(&task_space, now).await }),
                    );
                    in_flight.insert(handle.id(), space_id);
                }
                Some(Err(e)) => {
                    error!(error = %e, "Failed to enumerate spaces");
                    fatal = Some(e);
                    break;
                }
                None => break,
            }
        }
        drop(spaces);

        if deadline_hit {
            warn!(
                in_flight = workers.len(),
                "Sweep deadline approaching, no further spaces dispatched"
            );
        }

        loop {
            match timeout_at(hard_deadline, workers.join_next_with_id()).await {
                Ok(Some(joined)) => collect(joined, &mut in_flight, &mut summary),
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    let abandoned = workers.len() as u64;
                    warn!(
                        abandoned,
                        spaces = ?in_flight.values().map(SpaceId::as_str).collect::<Vec<_>>(),
                        "Sweep deadline reached, leaving in-flight spaces to finish on their own"
                    );
                    summary.record_abandoned(abandoned);
                    workers.detach_all();
                    break;
                }
            }
        }

        phase = phase.finish(deadline_hit);
        summary.outcome = phase;
        summary.duration_seconds = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;

        if let Some(source) = fatal {
            error!(
                error = %source,
                spaces_scanned = summary.spaces_scanned,
                "Sweep aborted"
            );
            return Err(SweepError {
                source,
                partial: summary,
            });
        }

        info!(
            outcome = ?summary.outcome,
            spaces_scanned = summary.spaces_scanned,
            spaces_succeeded = summary.spaces_succeeded,
            spaces_failed = summary.spaces_failed,
            spaces_removed = summary.spaces_removed,
            spaces_abandoned = summary.spaces_abandoned,
            active_users_deleted = summary.active_users_deleted,
            messages_deleted = summary.messages_deleted,
            duration_seconds = summary.duration_seconds,
            "Sweep complete"
        );

        Ok(summary)
    }
}

fn collect(
    joined: Result<(TaskId, SpaceOutcome), JoinError>,
    in_flight: &mut HashMap<TaskId, SpaceId>,
    summary: &mut SweepSummary,
) {
    match joined {
        Ok((task_id, outcome)) => {
            in_flight.remove(&task_id);
            match &outcome.status {
                SpaceStatus::Failed(failure) => warn!(
                    space_id = %outcome.space_id,
                    step = ?failure.step,
                    kind = ?failure.kind,
                    error = %failure.message,
                    deleted_active_users = outcome.presence_evicted,
                    deleted_messages = outcome.messages_evicted,
                    "Space processed with errors"
                ),
                _ => info!(
                    space_id = %outcome.space_id,
                    deleted_active_users = outcome.presence_evicted,
                    remaining_active_users = ?outcome.user_count,
                    deleted_messages = outcome.messages_evicted,
                    removed = matches!(outcome.status, SpaceStatus::Removed),
                    "Space processed"
                ),
            }
            summary.record(&outcome);
        }
        Err(e) => {
            let space_id = in_flight
                .remove(&e.id())
                .unwrap_or_else(|| SpaceId::from("<unknown>"));
            error!(space_id = %space_id, error = %e, "Space worker crashed");
            summary.record_crashed(space_id, e.to_string());
        }
    }
}
