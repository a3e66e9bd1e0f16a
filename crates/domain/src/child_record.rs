use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two time-bounded sub-collections owned by every space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Presence,
    Message,
}

impl ChildKind {
    pub const ALL: [ChildKind; 2] = [ChildKind::Presence, ChildKind::Message];

    /// Name of the sub-collection under the space document.
    pub fn collection_name(&self) -> &'static str {
        match self {
            ChildKind::Presence => "activeUsers",
            ChildKind::Message => "messages",
        }
    }

    /// Document field holding the liveness timestamp.
    pub fn timestamp_field(&self) -> &'static str {
        match self {
            ChildKind::Presence => "lastUpdate",
            ChildKind::Message => "timestamp",
        }
    }

    pub fn from_collection_name(name: &str) -> Option<Self> {
        match name {
            "activeUsers" => Some(ChildKind::Presence),
            "messages" => Some(ChildKind::Message),
            _ => None,
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// Liveness timestamp as read from a child document.
///
/// `Missing` covers an absent field, an explicit null and any value that does
/// not decode to a point in time. The TTL policy treats it as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildTimestamp {
    At(DateTime<Utc>),
    Missing,
}

impl ChildTimestamp {
    pub fn from_epoch_millis(millis: i64) -> Self {
        match Utc.timestamp_millis_opt(millis).single() {
            Some(at) => ChildTimestamp::At(at),
            None => ChildTimestamp::Missing,
        }
    }

    pub fn parse_rfc3339(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => ChildTimestamp::At(at.with_timezone(&Utc)),
            Err(_) => ChildTimestamp::Missing,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ChildTimestamp::At(at) => Some(*at),
            ChildTimestamp::Missing => None,
        }
    }
}

impl From<DateTime<Utc>> for ChildTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        ChildTimestamp::At(at)
    }
}

/// A presence or message document nested under a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRecord {
    pub id: String,
    pub timestamp: ChildTimestamp,
}

impl ChildRecord {
    pub fn new(id: impl Into<String>, timestamp: impl Into<ChildTimestamp>) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn missing_timestamp(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: ChildTimestamp::Missing,
        }
    }
}
