pub mod runner;
pub mod space_sweep;

pub use runner::JobRunner;
pub use space_sweep::SpaceSweepJob;
