pub mod clean_space;
pub mod run_sweep;

pub use clean_space::CleanSpaceUseCase;
pub use run_sweep::{LockSettings, RunSweepUseCase, SkipReason, SweepError, SweepOptions, SweepRun};
