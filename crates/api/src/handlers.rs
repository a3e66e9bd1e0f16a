pub mod health;
pub mod sweep;

pub use health::health_check;
pub use sweep::run_sweep;
