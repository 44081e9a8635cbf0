//! Telegram Mini App integration: host environment, identity resolution, init data verification

pub mod host;
pub mod identity;
pub mod webapp_auth;

pub use host::{TelegramHost, WebAppHost, WebAppState};
pub use identity::{resolve_init_data, resolve_user_id, signal_ready, InitDataSource, PageContext};
pub use webapp_auth::{InitData, InitDataError, WebAppUser};
