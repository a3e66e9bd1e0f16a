use spacesweep_application::use_cases::{RunSweepUseCase, SweepRun};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// In-process schedule for deployments without an external trigger.
pub struct SpaceSweepJob {
    sweep: Arc<RunSweepUseCase>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl SpaceSweepJob {
    pub fn new(sweep: Arc<RunSweepUseCase>) -> Self {
        Self {
            sweep,
            interval_secs: DEFAULT_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "Starting space sweep job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("SpaceSweepJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.run_once().await;
                    }
                }
            }
        });
    }

    async fn run_once(&self) {
        match self.sweep.execute().await {
            Ok(SweepRun::Finished(summary)) => {
                if summary.has_failures() {
                    warn!(
                        spaces_failed = summary.spaces_failed,
                        spaces_scanned = summary.spaces_scanned,
                        "Scheduled sweep finished with failures"
                    );
                } else {
                    info!(
                        spaces_scanned = summary.spaces_scanned,
                        active_users_deleted = summary.active_users_deleted,
                        messages_deleted = summary.messages_deleted,
                        "Scheduled sweep finished"
                    );
                }
            }
            Ok(SweepRun::Skipped { reason }) => {
                info!(reason = reason.as_str(), "Scheduled sweep skipped");
            }
            Err(e) => {
                error!(
                    error = %e,
                    spaces_scanned = e.partial.spaces_scanned,
                    "Scheduled sweep aborted"
                );
            }
        }
    }
}
