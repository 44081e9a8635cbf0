//! HTTP client for the registration API
//!
//! | operation | request |
//! |---|---|
//! | save draft | `PUT {base}/draft` |
//! | load draft | `GET {base}/draft` |
//! | submit | `POST {base}/submit` |
//! | health | `GET {base}/health` |
//!
//! Every request is JSON and carries `X-Telegram-Init-Data` whenever the page
//! context can resolve init data. The token is resolved again for each request.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use url::Url;

use crate::core::error::{ApiError, ApiResult};
use crate::registration::types::{Draft, DraftResponse};
use crate::telegram::identity::PageContext;

/// Header the backend reads the init data from
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    ok: bool,
}

/// Registration API client bound to one Mini App page
///
/// # Example
///
/// ```rust,no_run
/// use fclcore::{DraftClient, PageContext, WebAppHost};
/// use std::sync::Arc;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let page = PageContext::new(Url::parse("https://fcl.example/register")?)
///     .with_host(Arc::new(WebAppHost::with_init_data("query_id=...&hash=...")));
/// let client = DraftClient::new(&Url::parse("https://fcl.example/api")?, page)?;
///
/// if let Some(draft) = client.load_draft().await? {
///     client.submit_registration(&draft).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DraftClient {
    http: Client,
    base: String,
    page: PageContext,
}

impl DraftClient {
    pub fn new(api_base: &Url, page: PageContext) -> ApiResult<Self> {
        Ok(Self::with_http_client(Client::builder().build()?, api_base, page))
    }

    /// Uses a preconfigured reqwest client (proxies, timeouts, ...)
    pub fn with_http_client(http: Client, api_base: &Url, page: PageContext) -> Self {
        Self {
            http,
            base: api_base.as_str().trim_end_matches('/').to_string(),
            page,
        }
    }

    pub fn page(&self) -> &PageContext {
        &self.page
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Sends one request and classifies the response
    ///
    /// Non-2xx becomes [`ApiError::Status`] with whatever body the server sent;
    /// an unreadable body is reported as empty.
    async fn send(&self, method: Method, path: &str, body: Option<&Draft>) -> ApiResult<Response> {
        let init_data = self.page.init_data();
        tracing::debug!(
            method = %method,
            path,
            authenticated = init_data.is_some(),
            "Registration API request"
        );

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(init_data) = init_data {
            let value = HeaderValue::from_str(&init_data).map_err(|source| ApiError::InvalidInitData {
                header: INIT_DATA_HEADER,
                source,
            })?;
            request = request.header(INIT_DATA_HEADER, value);
        }
        if let Some(draft) = body {
            request = request.json(draft);
        }

        let response = request.send().await.inspect_err(|e| {
            tracing::warn!(method = %method, path, "Registration API request failed: {}", e);
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(method = %method, path, status = status.as_u16(), "Registration API error: {}", body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Replaces the stored draft for the current user
    pub async fn save_draft(&self, draft: &Draft) -> ApiResult<()> {
        self.send(Method::PUT, "/draft", Some(draft)).await?;
        Ok(())
    }

    /// Fetches the stored draft; `None` when nothing was saved yet
    pub async fn load_draft(&self) -> ApiResult<Option<Draft>> {
        let response = self.send(Method::GET, "/draft", None).await?;
        let bytes = response.bytes().await?;
        let parsed: DraftResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.draft)
    }

    /// Submits the final registration
    ///
    /// Not idempotent: calling it twice may register twice.
    pub async fn submit_registration(&self, draft: &Draft) -> ApiResult<()> {
        self.send(Method::POST, "/submit", Some(draft)).await?;
        tracing::info!(discipline = ?draft.discipline, mode = ?draft.mode, "Registration submitted");
        Ok(())
    }

    /// Backend liveness (`{"ok": true}`)
    pub async fn health(&self) -> ApiResult<bool> {
        let response = self.send(Method::GET, "/health", None).await?;
        let bytes = response.bytes().await?;
        let parsed: HealthResponse = serde_json::from_slice(&bytes)?;
        Ok(parsed.ok)
    }
}
