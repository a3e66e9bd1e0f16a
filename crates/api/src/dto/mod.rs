pub mod health;
pub mod sweep;

pub use health::HealthResponse;
pub use sweep::SweepResponse;
