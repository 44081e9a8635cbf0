//! FCL Mini App core — Telegram identity resolution and registration draft sync
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, and logging
//! - `telegram`: host environment, init data resolution and verification
//! - `registration`: draft model and the HTTP client for the registration API

pub mod core;
pub mod registration;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{ApiError, ClientConfig};
pub use registration::{Discipline, Draft, DraftClient, RegistrationMode};
pub use telegram::{PageContext, TelegramHost, WebAppHost};
