use clap::Parser;
use spacesweep_api::{dto::SweepResponse, AppState};
use spacesweep_application::use_cases::SweepRun;
use spacesweep_domain::config::LogFormat;
use spacesweep_domain::CliOverrides;
use spacesweep_jobs::{JobRunner, SpaceSweepJob};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "spacesweep")]
#[command(version)]
#[command(about = "Evicts stale presence and message documents from spaces")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Run a single sweep, print the summary and exit
    #[arg(long)]
    once: bool,

    /// Bind address
    #[arg(short = 'b', long, env = "BIND_ADDRESS")]
    bind: Option<String>,

    /// HTTP port
    #[arg(short = 'p', long, env = "PORT")]
    port: Option<u16>,

    /// Shared secret required on the sweep endpoint
    #[arg(long, env = "SWEEP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Database path
    #[arg(long, env = "DATABASE_PATH")]
    database: Option<String>,

    /// Logical database name reported by the health endpoint
    #[arg(long, env = "DATABASE_ID")]
    database_id: Option<String>,

    /// Presence documents older than this many minutes are evicted
    #[arg(long, env = "ACTIVE_USER_MINUTES")]
    active_user_minutes: Option<u32>,

    /// Messages older than this many hours are evicted
    #[arg(long, env = "MESSAGE_TTL_HOURS")]
    message_ttl_hours: Option<u32>,

    /// Documents deleted per batch (at most 500)
    #[arg(long, env = "BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Spaces cleaned in parallel
    #[arg(long, env = "SWEEP_MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Wall-clock budget of one sweep in seconds
    #[arg(long, env = "SWEEP_DEADLINE_SECS")]
    deadline_secs: Option<u64>,

    /// Seconds before the deadline at which no new spaces are dispatched
    #[arg(long, env = "SWEEP_DRAIN_MARGIN_SECS")]
    drain_margin_secs: Option<u64>,

    /// Lifetime of the overlap lock in seconds
    #[arg(long, env = "LOCK_TTL_SECONDS")]
    lock_ttl_secs: Option<u64>,

    /// Id of the overlap lock row
    #[arg(long, env = "LOCK_DOC_ID")]
    lock_id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            bind_address: self.bind.clone(),
            port: self.port,
            api_key: self.api_key.clone(),
            database_path: self.database.clone(),
            database_id: self.database_id.clone(),
            presence_ttl_minutes: self.active_user_minutes,
            message_ttl_hours: self.message_ttl_hours,
            batch_size: self.batch_size,
            max_concurrency: self.max_concurrency,
            deadline_secs: self.deadline_secs,
            drain_margin_secs: self.drain_margin_secs,
            lock_ttl_secs: self.lock_ttl_secs,
            lock_id: self.lock_id.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.database_id,
        "Starting spacesweep"
    );

    let pool = bootstrap::init_database(&config.database).await?;
    let repos = di::Repositories::new(pool, &config);
    let use_cases = di::UseCases::new(&repos, &config)?;

    if cli.once {
        return Ok(run_once(&use_cases).await);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(server::shutdown_on_signal(shutdown.clone()));

    if config.sweep.schedule_enabled {
        let job = SpaceSweepJob::new(use_cases.run_sweep.clone())
            .with_interval(config.sweep.interval_secs);
        JobRunner::new()
            .with_space_sweep(job)
            .with_shutdown_token(shutdown.clone())
            .start()
            .await;
    }

    let app_state = AppState {
        run_sweep: use_cases.run_sweep.clone(),
        database_id: Arc::from(config.database.database_id.as_str()),
        api_key: config.server.api_key.as_deref().map(Arc::from),
    };

    let web_addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    server::start_web_server(web_addr, app_state, shutdown).await?;

    use_cases.run_sweep.wait_for_detached().await;
    info!("Server shutdown complete");
    Ok(ExitCode::SUCCESS)
}

async fn run_once(use_cases: &di::UseCases) -> ExitCode {
    const REQUEST_ID: &str = "cli";

    let (response, code) = match use_cases.run_sweep.execute().await {
        Ok(SweepRun::Finished(summary)) => (
            SweepResponse::ok(summary, REQUEST_ID.to_string()),
            ExitCode::SUCCESS,
        ),
        Ok(SweepRun::Skipped { reason }) => (
            SweepResponse::skipped(reason, REQUEST_ID.to_string()),
            ExitCode::SUCCESS,
        ),
        Err(e) => {
            error!(error = %e, "Sweep failed");
            (
                SweepResponse::error(e.source.to_string(), e.partial, REQUEST_ID.to_string()),
                ExitCode::FAILURE,
            )
        }
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "Failed to serialize sweep summary"),
    }

    use_cases.run_sweep.wait_for_detached().await;
    code
}
