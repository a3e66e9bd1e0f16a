use serde::{Deserialize, Serialize};

/// Hard limit on documents per delete batch imposed by the backing store.
pub const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    #[serde(default = "default_presence_ttl_minutes")]
    pub presence_ttl_minutes: u32,

    #[serde(default = "default_message_ttl_hours")]
    pub message_ttl_hours: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Wall-clock budget of one run, aligned with the caller's request timeout.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,

    /// No new space is dispatched once less than this much budget remains.
    #[serde(default = "default_drain_margin_secs")]
    pub drain_margin_secs: u64,

    /// Run the sweep from an in-process timer in addition to HTTP triggers.
    #[serde(default)]
    pub schedule_enabled: bool,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            presence_ttl_minutes: default_presence_ttl_minutes(),
            message_ttl_hours: default_message_ttl_hours(),
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            deadline_secs: default_deadline_secs(),
            drain_margin_secs: default_drain_margin_secs(),
            schedule_enabled: false,
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_presence_ttl_minutes() -> u32 {
    10
}

fn default_message_ttl_hours() -> u32 {
    24
}

fn default_batch_size() -> usize {
    450
}

fn default_max_concurrency() -> usize {
    16
}

fn default_deadline_secs() -> u64 {
    540
}

fn default_drain_margin_secs() -> u64 {
    30
}

fn default_interval_secs() -> u64 {
    3600
}
