//! Spacesweep Domain Layer
pub mod child_record;
pub mod config;
pub mod errors;
pub mod space;
pub mod sweep;
pub mod ttl_policy;

pub use child_record::{ChildKind, ChildRecord, ChildTimestamp};
pub use config::{CliOverrides, Config, ConfigError};
pub use errors::DomainError;
pub use space::SpaceId;
pub use sweep::{
    FailedSpace, FailureKind, SpaceFailure, SpaceOutcome, SpaceStatus, SweepPhase, SweepStep,
    SweepSummary,
};
pub use ttl_policy::{Partition, TtlPolicy};
