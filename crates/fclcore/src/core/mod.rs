//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, ConfigError};
pub use logging::init_logger;
