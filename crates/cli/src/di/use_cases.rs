use super::Repositories;
use spacesweep_application::ports::SpaceStore;
use spacesweep_application::use_cases::{
    CleanSpaceUseCase, LockSettings, RunSweepUseCase, SweepOptions,
};
use spacesweep_domain::{Config, TtlPolicy};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct UseCases {
    pub run_sweep: Arc<RunSweepUseCase>,
}

impl UseCases {
    pub fn new(repos: &Repositories, config: &Config) -> anyhow::Result<Self> {
        let policy = TtlPolicy::from_config(&config.sweep)?;
        let store: Arc<dyn SpaceStore> = repos.space_store.clone();
        let clean_space = Arc::new(CleanSpaceUseCase::new(store.clone(), policy));

        let mut run_sweep =
            RunSweepUseCase::new(store, clean_space, SweepOptions::from_config(&config.sweep));
        if config.lock.enabled {
            let holder = lock_holder();
            info!(holder = %holder, lock_id = %config.lock.lock_id, "Sweep lock enabled");
            run_sweep = run_sweep.with_lock(
                repos.sweep_lock.clone(),
                LockSettings {
                    holder,
                    ttl: Duration::from_secs(config.lock.ttl_secs),
                },
            );
        }

        Ok(Self {
            run_sweep: Arc::new(run_sweep),
        })
    }
}

/// `<hostname>-<pid>`, unique per running instance.
fn lock_holder() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("{}-{}", host, std::process::id())
}
