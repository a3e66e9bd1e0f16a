use spacesweep_application::use_cases::RunSweepUseCase;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub run_sweep: Arc<RunSweepUseCase>,
    pub database_id: Arc<str>,
    /// Shared secret for the sweep trigger; `None` leaves it open.
    pub api_key: Option<Arc<str>>,
}
