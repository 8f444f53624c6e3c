//! Client configuration

use std::time::Duration;

/// Default production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.pdfmint.io";

/// Default request timeout (120 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// API key sent as the `x-api-key` header
    pub api_key: String,
    /// Conversion API endpoint URL (no trailing slash)
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Maximum retry attempts after the initial one
    pub max_retries: u32,
}

impl Config {
    /// Create a new config with the given API key and all other fields
    /// at their defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("pdfmint-client/{}", env!("CARGO_PKG_VERSION")),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the endpoint. One trailing slash is stripped so paths can
    /// be appended verbatim.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url
            .strip_suffix('/')
            .map(str::to_string)
            .unwrap_or(base_url);
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the maximum number of retries after the initial attempt
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}
