use crate::handlers;
use crate::middleware::require_api_key;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

pub fn create_api_routes(state: AppState) -> Router {
    let sweep = Router::new()
        .route("/", get(handlers::run_sweep).post(handlers::run_sweep))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/healthz", get(handlers::health_check))
        .merge(sweep)
        .with_state(state)
}
