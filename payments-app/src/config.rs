//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use anyhow::Context;
use payments_gateway::GatewayConfig;
use payments_gateway::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub gateway: GatewayConfig,
    /// OTLP collector; tracing export is off when unset
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(port) => port.trim().parse().context("PORT must be a port number")?,
            None => 3000,
        };

        let database_url = non_empty("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let use_mock = match non_empty("PAYSTACK_USE_MOCK") {
            Some(flag) => parse_flag(&flag)
                .ok_or_else(|| anyhow::anyhow!("PAYSTACK_USE_MOCK must be true or false"))?,
            None => false,
        };

        let timeout = match non_empty("PAYSTACK_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .context("PAYSTACK_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        let gateway = match (use_mock, non_empty("PAYSTACK_SECRET_KEY")) {
            (false, Some(secret_key)) => GatewayConfig::new(secret_key),
            (false, None) => anyhow::bail!(
                "PAYSTACK_SECRET_KEY is required unless PAYSTACK_USE_MOCK=true"
            ),
            (true, secret_key) => GatewayConfig {
                secret_key: secret_key.unwrap_or_default(),
                ..GatewayConfig::mock()
            },
        };
        let gateway = gateway
            .with_base_url(non_empty("PAYSTACK_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()))
            .with_timeout(timeout);

        Ok(Self {
            port,
            database_url,
            gateway,
            otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Secret used to check webhook signatures; none in mock mode without a key.
    pub fn webhook_secret(&self) -> Option<&str> {
        Some(self.gateway.secret_key.as_str()).filter(|k| !k.is_empty())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PAYSTACK_SECRET_KEY", "sk_test_123"),
        ])
        .unwrap();

        assert_eq!(config.port, 3000);
        assert!(!config.gateway.use_mock);
        assert_eq!(config.gateway.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gateway.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.webhook_secret(), Some("sk_test_123"));
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_database_url_required() {
        let err = load(&[("PAYSTACK_SECRET_KEY", "sk_test_123")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_secret_required_unless_mock() {
        assert!(load(&[("DATABASE_URL", "sqlite::memory:")]).is_err());

        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PAYSTACK_USE_MOCK", "true"),
        ])
        .unwrap();
        assert!(config.gateway.use_mock);
        assert!(config.webhook_secret().is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/payments"),
            ("PAYSTACK_SECRET_KEY", "sk_live_abc"),
            ("PAYSTACK_BASE_URL", "http://localhost:9999"),
            ("PAYSTACK_TIMEOUT_SECS", "5"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.gateway.base_url, "http://localhost:9999");
        assert_eq!(config.gateway.timeout, Duration::from_secs(5));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = [("DATABASE_URL", "sqlite::memory:"), ("PAYSTACK_USE_MOCK", "true")];
        assert!(load(&[base[0], base[1], ("PORT", "http")]).is_err());
        assert!(load(&[base[0], ("PAYSTACK_USE_MOCK", "maybe")]).is_err());
        assert!(load(&[base[0], base[1], ("PAYSTACK_TIMEOUT_SECS", "-1")]).is_err());
    }
}
