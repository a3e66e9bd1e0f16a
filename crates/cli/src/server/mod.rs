pub mod web;

pub use web::{shutdown_on_signal, start_web_server};
