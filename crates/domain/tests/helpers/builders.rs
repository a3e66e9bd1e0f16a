#![allow(dead_code)]
use chrono::{DateTime, TimeDelta, Utc};
use spacesweep_domain::{
    ChildTimestamp, SpaceFailure, SpaceId, SpaceOutcome, SpaceStatus, SweepStep,
};

pub fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> ChildTimestamp {
    ChildTimestamp::At(now - TimeDelta::minutes(minutes))
}

pub struct SpaceOutcomeBuilder {
    space_id: SpaceId,
    presence_evicted: u64,
    messages_evicted: u64,
    user_count: Option<u64>,
    status: SpaceStatus,
}

impl SpaceOutcomeBuilder {
    pub fn new(space_id: &str) -> Self {
        Self {
            space_id: SpaceId::from(space_id),
            presence_evicted: 0,
            messages_evicted: 0,
            user_count: Some(0),
            status: SpaceStatus::Cleaned,
        }
    }

    pub fn presence_evicted(mut self, n: u64) -> Self {
        self.presence_evicted = n;
        self
    }

    pub fn messages_evicted(mut self, n: u64) -> Self {
        self.messages_evicted = n;
        self
    }

    pub fn user_count(mut self, n: Option<u64>) -> Self {
        self.user_count = n;
        self
    }

    pub fn failed_at(mut self, step: SweepStep, message: &str) -> Self {
        self.status = SpaceStatus::Failed(SpaceFailure::at(step, message));
        self
    }

    pub fn removed(mut self) -> Self {
        self.status = SpaceStatus::Removed;
        self
    }

    pub fn build(self) -> SpaceOutcome {
        SpaceOutcome {
            space_id: self.space_id,
            presence_evicted: self.presence_evicted,
            messages_evicted: self.messages_evicted,
            user_count: self.user_count,
            status: self.status,
        }
    }
}
