use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE_URL: &str = "https://localhost:8000";
const DEFAULT_CHECKOUT_BASE_URL: &str = "https://localhost:4201";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    /// Origin serving the PSP checkout page (web shop "continue payment")
    pub checkout_base_url: String,
    pub environment: String,
    pub enable_logging: bool,
    pub network_timeout_seconds: u32,
    pub idle_timeout_minutes: u32,
    pub clock_skew_seconds: u32,
    pub crypto_poll_interval_seconds: u32,
    pub redirect_delay_ms: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            checkout_base_url: DEFAULT_CHECKOUT_BASE_URL.to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            network_timeout_seconds: 30,
            idle_timeout_minutes: 15,
            clock_skew_seconds: 30,
            crypto_poll_interval_seconds: 3,
            redirect_delay_ms: 2000,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from compile-time environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: normalize_base_url(
                option_env!("API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL),
            ),
            checkout_base_url: normalize_base_url(
                option_env!("CHECKOUT_BASE_URL").unwrap_or(DEFAULT_CHECKOUT_BASE_URL),
            ),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development")
                .to_string(),
            enable_logging: parse_or(option_env!("ENABLE_LOGGING"), defaults.enable_logging),
            network_timeout_seconds: parse_or(
                option_env!("NETWORK_TIMEOUT_SECONDS"),
                defaults.network_timeout_seconds,
            ),
            idle_timeout_minutes: parse_or(
                option_env!("IDLE_TIMEOUT_MINUTES"),
                defaults.idle_timeout_minutes,
            ),
            clock_skew_seconds: parse_or(
                option_env!("CLOCK_SKEW_SECONDS"),
                defaults.clock_skew_seconds,
            ),
            crypto_poll_interval_seconds: parse_or(
                option_env!("CRYPTO_POLL_INTERVAL_SECONDS"),
                defaults.crypto_poll_interval_seconds,
            ),
            redirect_delay_ms: parse_or(option_env!("REDIRECT_DELAY_MS"), defaults.redirect_delay_ms),
        }
    }

    /// Base URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Checkout page URL for a PSP payment id
    pub fn checkout_url(&self, payment_id: &str) -> String {
        format!(
            "{}/checkout/{}",
            self.checkout_base_url.trim_end_matches('/'),
            urlencoding::encode(payment_id)
        )
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }

    pub fn log_level(&self) -> log::Level {
        if self.is_production() {
            log::Level::Warn
        } else {
            log::Level::Debug
        }
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.network_timeout_seconds))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.idle_timeout_minutes) * 60)
    }

    pub fn clock_skew(&self) -> Duration {
        Duration::from_secs(u64::from(self.clock_skew_seconds))
    }

    pub fn crypto_poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.crypto_poll_interval_seconds))
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.redirect_delay_ms))
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

// Compiled-in configuration, read-only
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
