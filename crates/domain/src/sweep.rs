use crate::space::SpaceId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a single sweep run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPhase {
    Idle,
    Running,
    Completed,
    DeadlineExceeded,
}

impl SweepPhase {
    pub fn start(self) -> Self {
        match self {
            SweepPhase::Idle => SweepPhase::Running,
            other => other,
        }
    }

    pub fn finish(self, deadline_hit: bool) -> Self {
        match self {
            SweepPhase::Running if deadline_hit => SweepPhase::DeadlineExceeded,
            SweepPhase::Running => SweepPhase::Completed,
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SweepPhase::Completed | SweepPhase::DeadlineExceeded)
    }
}

/// Step of the per-space pass at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepStep {
    ListPresence,
    DeletePresence,
    WriteUserCount,
    ListMessages,
    DeleteMessages,
}

impl SweepStep {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            SweepStep::ListPresence | SweepStep::ListMessages => FailureKind::ReadError,
            SweepStep::DeletePresence | SweepStep::DeleteMessages => FailureKind::DeleteError,
            SweepStep::WriteUserCount => FailureKind::WriteError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ReadError,
    DeleteError,
    WriteError,
    WorkerPanic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceFailure {
    pub step: SweepStep,
    pub kind: FailureKind,
    pub message: String,
}

impl SpaceFailure {
    pub fn at(step: SweepStep, message: impl Into<String>) -> Self {
        Self {
            step,
            kind: step.failure_kind(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceStatus {
    Cleaned,
    /// The space document disappeared while it was being swept.
    Removed,
    Failed(SpaceFailure),
}

/// What one per-space pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceOutcome {
    pub space_id: SpaceId,
    pub presence_evicted: u64,
    pub messages_evicted: u64,
    /// Value written to `currentUserCount`, when the write happened.
    pub user_count: Option<u64>,
    pub status: SpaceStatus,
}

impl SpaceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SpaceStatus::Cleaned)
    }

    pub fn failure(&self) -> Option<&SpaceFailure> {
        match &self.status {
            SpaceStatus::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSpace {
    pub space_id: SpaceId,
    /// `None` when the worker died before reporting a step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<SweepStep>,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregated result of a sweep run, returned to the trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub outcome: SweepPhase,
    pub started_at: DateTime<Utc>,
    pub spaces_scanned: u64,
    pub spaces_succeeded: u64,
    pub spaces_failed: u64,
    pub spaces_removed: u64,
    pub spaces_abandoned: u64,
    pub active_users_deleted: u64,
    pub messages_deleted: u64,
    pub spaces_with_user_deletions: u64,
    pub spaces_with_message_deletions: u64,
    pub failures: Vec<FailedSpace>,
    pub duration_seconds: f64,
}

impl SweepSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            outcome: SweepPhase::Idle,
            started_at,
            spaces_scanned: 0,
            spaces_succeeded: 0,
            spaces_failed: 0,
            spaces_removed: 0,
            spaces_abandoned: 0,
            active_users_deleted: 0,
            messages_deleted: 0,
            spaces_with_user_deletions: 0,
            spaces_with_message_deletions: 0,
            failures: Vec::new(),
            duration_seconds: 0.0,
        }
    }

    pub fn record(&mut self, outcome: &SpaceOutcome) {
        self.spaces_scanned += 1;
        self.active_users_deleted += outcome.presence_evicted;
        self.messages_deleted += outcome.messages_evicted;
        if outcome.presence_evicted > 0 {
            self.spaces_with_user_deletions += 1;
        }
        if outcome.messages_evicted > 0 {
            self.spaces_with_message_deletions += 1;
        }

        match &outcome.status {
            SpaceStatus::Cleaned => self.spaces_succeeded += 1,
            SpaceStatus::Removed => self.spaces_removed += 1,
            SpaceStatus::Failed(failure) => {
                self.spaces_failed += 1;
                self.failures.push(FailedSpace {
                    space_id: outcome.space_id.clone(),
                    step: Some(failure.step),
                    kind: failure.kind,
                    message: failure.message.clone(),
                });
            }
        }
    }

    /// A worker died before producing an outcome.
    pub fn record_crashed(&mut self, space_id: SpaceId, message: impl Into<String>) {
        self.spaces_scanned += 1;
        self.spaces_failed += 1;
        self.failures.push(FailedSpace {
            space_id,
            step: None,
            kind: FailureKind::WorkerPanic,
            message: message.into(),
        });
    }

    pub fn record_abandoned(&mut self, count: u64) {
        self.spaces_abandoned += count;
    }

    pub fn has_failures(&self) -> bool {
        self.spaces_failed > 0
    }
}
