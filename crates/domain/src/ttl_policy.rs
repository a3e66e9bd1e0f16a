use crate::child_record::{ChildKind, ChildRecord, ChildTimestamp};
use crate::config::{ConfigError, SweepConfig};
use chrono::{DateTime, TimeDelta, Utc};

const DEFAULT_PRESENCE_TTL_MINUTES: i64 = 10;
const DEFAULT_MESSAGE_TTL_HOURS: i64 = 24;

/// Per-kind time-to-live table.
///
/// A record is stale when `now - timestamp > ttl`; a record exactly at the
/// boundary is kept. Records without a usable timestamp are always stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    presence_ttl: TimeDelta,
    message_ttl: TimeDelta,
}

/// Result of splitting a listed sub-collection with [`TtlPolicy::partition`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub stale: Vec<String>,
    pub live: Vec<String>,
}

impl TtlPolicy {
    pub fn new(presence_ttl: TimeDelta, message_ttl: TimeDelta) -> Self {
        Self {
            presence_ttl,
            message_ttl,
        }
    }

    pub fn from_config(cfg: &SweepConfig) -> Result<Self, ConfigError> {
        let presence_ttl = TimeDelta::try_minutes(cfg.presence_ttl_minutes as i64).ok_or_else(
            || ConfigError::Validation("presence_ttl_minutes is out of range".to_string()),
        )?;
        let message_ttl = TimeDelta::try_hours(cfg.message_ttl_hours as i64).ok_or_else(|| {
            ConfigError::Validation("message_ttl_hours is out of range".to_string())
        })?;
        Ok(Self::new(presence_ttl, message_ttl))
    }

    pub fn ttl_for(&self, kind: ChildKind) -> TimeDelta {
        match kind {
            ChildKind::Presence => self.presence_ttl,
            ChildKind::Message => self.message_ttl,
        }
    }

    pub fn is_stale(&self, kind: ChildKind, timestamp: &ChildTimestamp, now: DateTime<Utc>) -> bool {
        match timestamp {
            ChildTimestamp::At(at) => now.signed_duration_since(*at) > self.ttl_for(kind),
            ChildTimestamp::Missing => true,
        }
    }

    pub fn partition<'a, I>(&self, kind: ChildKind, records: I, now: DateTime<Utc>) -> Partition
    where
        I: IntoIterator<Item = &'a ChildRecord>,
    {
        let mut partition = Partition::default();
        for record in records {
            if self.is_stale(kind, &record.timestamp, now) {
                partition.stale.push(record.id.clone());
            } else {
                partition.live.push(record.id.clone());
            }
        }
        partition
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            presence_ttl: TimeDelta::minutes(DEFAULT_PRESENCE_TTL_MINUTES),
            message_ttl: TimeDelta::hours(DEFAULT_MESSAGE_TTL_HOURS),
        }
    }
}
