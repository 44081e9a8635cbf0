//! Identity resolution for the current Mini App session
//!
//! The init data can reach the page three ways, tried in this order:
//! 1. the host interface (`Telegram.WebApp.initData`)
//! 2. the `initData` query parameter (manual testing, deep links)
//! 3. the URL fragment, under `initData` or `tgWebAppData`
//!
//! The first non-empty value wins. Every lookup is a pure function of the page
//! URL and the optional host, so resolution never fails: missing state is `None`.

use std::fmt;
use std::sync::Arc;
use url::{form_urlencoded, Url};

use crate::telegram::host::TelegramHost;

/// Query parameter carrying init data
pub const QUERY_KEY: &str = "initData";

/// Fragment parameters carrying init data. Synonyms with equal priority; depending
/// on the launch context the host delivers the payload under either name.
pub const FRAGMENT_KEYS: [&str; 2] = ["initData", "tgWebAppData"];

/// Where a resolved init data value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum InitDataSource {
    Host,
    Query,
    Fragment,
}

/// Resolves the best available init data
pub fn resolve_init_data(host: Option<&dyn TelegramHost>, location: &Url) -> Option<String> {
    resolve_init_data_with_source(host, location).map(|(_, value)| value)
}

/// Same as [`resolve_init_data`], also reporting which source won
pub fn resolve_init_data_with_source(
    host: Option<&dyn TelegramHost>,
    location: &Url,
) -> Option<(InitDataSource, String)> {
    from_host(host)
        .map(|v| (InitDataSource::Host, v))
        .or_else(|| from_query(location).map(|v| (InitDataSource::Query, v)))
        .or_else(|| from_fragment(location).map(|v| (InitDataSource::Fragment, v)))
}

/// Reads `initDataUnsafe.user.id` from the host
///
/// `None` when the host, any intermediate object, or the id itself is missing,
/// or when the id is not an integer.
pub fn resolve_user_id(host: Option<&dyn TelegramHost>) -> Option<i64> {
    host?.init_data_unsafe()?.pointer("/user/id")?.as_i64()
}

/// Tells the host the page is ready and should be expanded. No-op without a host.
pub fn signal_ready(host: Option<&dyn TelegramHost>) {
    match host {
        Some(host) => {
            host.ready();
            host.expand();
            tracing::debug!("Signalled ready + expand to Telegram host");
        }
        None => tracing::debug!("No Telegram host, skipping ready signal"),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn from_host(host: Option<&dyn TelegramHost>) -> Option<String> {
    host?.init_data().and_then(non_empty)
}

fn from_query(location: &Url) -> Option<String> {
    // Like URLSearchParams.get: the first occurrence decides.
    location
        .query_pairs()
        .find(|(key, _)| key == QUERY_KEY)
        .and_then(|(_, value)| non_empty(&value))
}

fn from_fragment(location: &Url) -> Option<String> {
    let fragment = location.fragment()?;
    FRAGMENT_KEYS.iter().find_map(|wanted| {
        form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == wanted)
            .and_then(|(_, value)| non_empty(&value))
    })
}

/// The page a Mini App runs in: its URL plus the optional Telegram host
///
/// Cheap to clone; the host is shared.
#[derive(Clone)]
pub struct PageContext {
    host: Option<Arc<dyn TelegramHost>>,
    location: Url,
}

impl PageContext {
    /// Page opened outside Telegram
    pub fn new(location: Url) -> Self {
        Self { host: None, location }
    }

    pub fn with_host(mut self, host: Arc<dyn TelegramHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn host(&self) -> Option<&dyn TelegramHost> {
        self.host.as_deref()
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn init_data(&self) -> Option<String> {
        resolve_init_data(self.host(), &self.location)
    }

    pub fn init_data_with_source(&self) -> Option<(InitDataSource, String)> {
        resolve_init_data_with_source(self.host(), &self.location)
    }

    pub fn user_id(&self) -> Option<i64> {
        resolve_user_id(self.host())
    }

    pub fn signal_ready(&self) {
        signal_ready(self.host())
    }
}

impl fmt::Debug for PageContext {
    // The URL may carry init data, so only the path is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("has_host", &self.host.is_some())
            .field("path", &self.location.path())
            .finish()
    }
}
