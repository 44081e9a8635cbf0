use thiserror::Error;

/// Failure of a registration API call
///
/// Transport-level and protocol-level failures are both surfaced through this
/// one type so callers only have to handle a single error value.
///
/// # Example
///
/// ```no_run
/// use fclcore::core::error::ApiError;
///
/// fn report(err: &ApiError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("API {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be completed (connect, TLS, body read, bad URL)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response carried a body that does not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Resolved init data contains bytes a header cannot carry; nothing was sent
    #[error("Init data cannot be sent as {header}: {source}")]
    InvalidInitData {
        header: &'static str,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
}

impl ApiError {
    /// HTTP status code, for protocol failures only
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidInitData { .. } => None,
        }
    }
}

/// Type alias for Result with ApiError
pub type ApiResult<T> = Result<T, ApiError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid URL '{value}': {source}")]
    Url {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Figment(Box::new(err))
    }
}
