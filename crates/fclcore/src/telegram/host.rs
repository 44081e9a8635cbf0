//! Telegram Mini App host environment
//!
//! The host (`window.Telegram.WebApp` in a browser) is optional context: the
//! page may be opened outside Telegram, in which case no host exists at all.
//! Code that needs it takes `Option<&dyn TelegramHost>` instead of reaching
//! for a global.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Capability surface of the Telegram host
///
/// `ready` and `expand` default to no-ops, matching hosts that do not expose them.
pub trait TelegramHost: Send + Sync {
    /// Signed init data string (`Telegram.WebApp.initData`)
    fn init_data(&self) -> Option<&str>;

    /// Unverified parsed payload (`Telegram.WebApp.initDataUnsafe`)
    fn init_data_unsafe(&self) -> Option<&Value>;

    /// Tell the host the page finished initializing
    fn ready(&self) {}

    /// Ask the host to expand the page to full height
    fn expand(&self) {}
}

/// Snapshot of the fields the client reads from `Telegram.WebApp`
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebAppState {
    #[serde(default)]
    pub init_data: Option<String>,
    /// Kept as raw JSON: the resolver must tolerate any shape here
    #[serde(default)]
    pub init_data_unsafe: Option<Value>,
}

impl fmt::Debug for WebAppState {
    // Both fields carry the signed payload, so only their presence is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebAppState")
            .field("init_data", &self.init_data.as_ref().map(|_| "[REDACTED]"))
            .field("init_data_unsafe", &self.init_data_unsafe.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Host backed by a static [`WebAppState`]
///
/// Lifecycle calls are counted rather than forwarded anywhere, which is what a
/// non-browser process (CLI, tests) can honestly do with them.
#[derive(Debug, Default)]
pub struct WebAppHost {
    state: WebAppState,
    ready_calls: AtomicUsize,
    expand_calls: AtomicUsize,
}

impl WebAppHost {
    pub fn new(state: WebAppState) -> Self {
        Self {
            state,
            ready_calls: AtomicUsize::new(0),
            expand_calls: AtomicUsize::new(0),
        }
    }

    /// Host that only carries an init data string
    pub fn with_init_data(init_data: impl Into<String>) -> Self {
        Self::new(WebAppState {
            init_data: Some(init_data.into()),
            init_data_unsafe: None,
        })
    }

    /// Parses a JSON snapshot of `Telegram.WebApp`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Reads a JSON snapshot of `Telegram.WebApp` from disk
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = fs_err::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| anyhow::anyhow!("Invalid host state in {}: {}", path.display(), e))
    }

    pub fn state(&self) -> &WebAppState {
        &self.state
    }

    pub fn ready_count(&self) -> usize {
        self.ready_calls.load(Ordering::Relaxed)
    }

    pub fn expand_count(&self) -> usize {
        self.expand_calls.load(Ordering::Relaxed)
    }
}

impl TelegramHost for WebAppHost {
    fn init_data(&self) -> Option<&str> {
        self.state.init_data.as_deref()
    }

    fn init_data_unsafe(&self) -> Option<&Value> {
        self.state.init_data_unsafe.as_ref()
    }

    fn ready(&self) {
        self.ready_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn expand(&self) {
        self.expand_calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json_full_snapshot() {
        let host = WebAppHost::from_json(
            r#"{
                "initData": "query_id=AAA&hash=abc",
                "initDataUnsafe": {"user": {"id": 42, "username": "neo"}},
                "version": "7.0",
                "platform": "ios"
            }"#,
        )
        .unwrap();

        assert_eq!(host.init_data(), Some("query_id=AAA&hash=abc"));
        assert_eq!(host.init_data_unsafe().unwrap()["user"]["id"], 42);
    }

    #[test]
    fn test_from_json_empty_object() {
        let host = WebAppHost::from_json("{}").unwrap();
        assert!(host.init_data().is_none());
        assert!(host.init_data_unsafe().is_none());
    }

    #[test]
    fn test_lifecycle_calls_are_counted() {
        let host = WebAppHost::default();
        host.ready();
        host.expand();
        host.expand();
        assert_eq!(host.ready_count(), 1);
        assert_eq!(host.expand_count(), 2);
    }

    #[test]
    fn test_debug_redacts_payload() {
        let host = WebAppHost::from_json(
            r#"{"initData": "query_id=AAA&hash=deadbeef", "initDataUnsafe": {"user": {"id": 42, "username": "neo"}}}"#,
        )
        .unwrap();

        let debug = format!("{:?}", host);
        assert!(!debug.contains("deadbeef"));
        assert!(!debug.contains("neo"));
        assert!(debug.contains("[REDACTED]"));
        assert!(format!("{:?}", WebAppState::default()).contains("init_data: None"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"initData": "from-disk"}}"#).unwrap();

        let host = WebAppHost::from_file(file.path()).unwrap();
        assert_eq!(host.init_data(), Some("from-disk"));
    }

    #[test]
    fn test_from_file_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = WebAppHost::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid host state"));
    }
}
