use crate::{dto::SweepResponse, errors::ApiError, state::AppState};
use axum::{extract::State, http::HeaderMap, Json};
use spacesweep_application::use_cases::SweepRun;
use tracing::{info, instrument};

const TRACE_HEADER: &str = "X-Cloud-Trace-Context";
const DEFAULT_REQUEST_ID: &str = "manual";

pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(TRACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_REQUEST_ID)
        .to_string()
}

#[instrument(skip(state, headers), name = "api_run_sweep")]
pub async fn run_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepResponse>, ApiError> {
    let request_id = request_id(&headers);
    info!(request_id = %request_id, database = %state.database_id, "Sweep requested");

    match state.run_sweep.execute().await {
        Ok(SweepRun::Finished(summary)) => Ok(Json(SweepResponse::ok(summary, request_id))),
        Ok(SweepRun::Skipped { reason }) => {
            info!(request_id = %request_id, reason = reason.as_str(), "Sweep skipped");
            Ok(Json(SweepResponse::skipped(reason, request_id)))
        }
        Err(e) => Err(ApiError::sweep_failed(e, request_id)),
    }
}
