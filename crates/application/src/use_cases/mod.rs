pub mod sweep;

pub use sweep::{
    CleanSpaceUseCase, LockSettings, RunSweepUseCase, SkipReason, SweepError, SweepOptions,
    SweepRun,
};
