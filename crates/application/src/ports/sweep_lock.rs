use async_trait::async_trait;
use spacesweep_domain::DomainError;
use std::time::Duration;

/// Advisory lock that keeps two sweeps from overlapping.
///
/// The lock expires on its own after `ttl`, so a crashed holder never blocks
/// later runs for longer than that.
#[async_trait]
pub trait SweepLock: Send + Sync {
    /// Returns `false` when another holder owns an unexpired lock.
    async fn try_acquire(&self, holder: &str, ttl: Duration) -> Result<bool, DomainError>;

    async fn release(&self, holder: &str) -> Result<(), DomainError>;
}
