//! Gateway connection settings.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings passed to [`crate::build_gateway`] at start-up.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    /// Use the in-memory mock instead of calling Paystack
    pub use_mock: bool,
    /// Transport timeout for each gateway request
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: secret_key.into(),
            use_mock: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn mock() -> Self {
        Self {
            use_mock: true,
            ..Self::new("")
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
