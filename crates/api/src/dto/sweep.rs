use serde::Serialize;
use spacesweep_application::use_cases::SkipReason;
use spacesweep_domain::SweepSummary;

#[derive(Serialize, Debug, Clone)]
pub struct SweepResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SweepSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub request_id: String,
}

impl SweepResponse {
    pub fn ok(stats: SweepSummary, request_id: String) -> Self {
        Self {
            status: "ok",
            stats: Some(stats),
            reason: None,
            error: None,
            request_id,
        }
    }

    pub fn skipped(reason: SkipReason, request_id: String) -> Self {
        Self {
            status: "skipped",
            stats: None,
            reason: Some(reason.as_str()),
            error: None,
            request_id,
        }
    }

    /// Partial stats are kept so a failed run still shows what it did.
    pub fn error(error: String, partial: SweepSummary, request_id: String) -> Self {
        Self {
            status: "error",
            stats: Some(partial),
            reason: None,
            error: Some(error),
            request_id,
        }
    }
}
