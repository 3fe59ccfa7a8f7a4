//! Startup configuration.

pub mod app;

pub use app::{AppConfig, SourceConfig};
