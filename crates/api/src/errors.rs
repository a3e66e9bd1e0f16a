use crate::dto::SweepResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use spacesweep_application::use_cases::SweepError;
use tracing::error;

pub enum ApiError {
    SweepFailed {
        error: SweepError,
        request_id: String,
    },
}

impl ApiError {
    pub fn sweep_failed(error: SweepError, request_id: String) -> Self {
        ApiError::SweepFailed { error, request_id }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::SweepFailed { error, request_id } => {
                error!(request_id = %request_id, error = %error, "Sweep failed");
                let body =
                    SweepResponse::error(error.source.to_string(), error.partial, request_id);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
