pub mod database;
pub mod errors;
pub mod lock;
pub mod logging;
pub mod root;
pub mod server;
pub mod sweep;

pub use database::DatabaseConfig;
pub use errors::ConfigError;
pub use lock::LockConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use sweep::SweepConfig;
