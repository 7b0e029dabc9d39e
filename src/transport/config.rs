use std::str::FromStr;
use std::time::Duration;

use crate::core::{AmegoError, ValidationError};

/// Production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://invoice-api.amego.tw";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client settings. Construct with [`ClientConfig::builder`] or
/// [`ClientConfig::from_env`]; both validate before returning.
#[derive(Clone)]
pub struct ClientConfig {
    /// Seller tax ID (統一編號), 8 digits.
    pub tax_id: String,
    /// Signing secret issued by the vendor.
    pub app_key: String,
    pub base_url: String,
    /// Deadline for each HTTP call.
    pub timeout: Duration,
    /// Sign with the local clock instead of the server-synced one.
    pub skip_time_sync: bool,
    /// `None` disables retries.
    pub retry: Option<RetryConfig>,
    /// `None` disables rate limiting.
    pub rate_limit: Option<RateLimitConfig>,
    pub logging: LoggingConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("tax_id", &self.tax_id)
            .field("app_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("skip_time_sync", &self.skip_time_sync)
            .field("retry", &self.retry)
            .field("rate_limit", &self.rate_limit)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ClientConfig {
    pub fn builder(tax_id: impl Into<String>, app_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(tax_id, app_key)
    }

    /// Load from `AMEGO_*` environment variables.
    ///
    /// `AMEGO_TAX_ID` and `AMEGO_APP_KEY` are required; `AMEGO_BASE_URL`,
    /// `AMEGO_TIMEOUT_SECS`, `AMEGO_SKIP_TIME_SYNC` and `AMEGO_LOG_LEVEL`
    /// override the defaults.
    pub fn from_env() -> Result<Self, AmegoError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AmegoError> {
        let mut errors = Vec::new();

        let tax_id = lookup("AMEGO_TAX_ID").unwrap_or_default();
        let app_key = lookup("AMEGO_APP_KEY").unwrap_or_default();
        if tax_id.is_empty() {
            errors.push(ValidationError::new("AMEGO_TAX_ID", "environment variable is not set"));
        }
        if app_key.is_empty() {
            errors.push(ValidationError::new("AMEGO_APP_KEY", "environment variable is not set"));
        }

        let mut builder = ClientConfigBuilder::new(tax_id, app_key);

        if let Some(url) = lookup("AMEGO_BASE_URL").filter(|v| !v.is_empty()) {
            builder = builder.base_url(url);
        }
        if let Some(secs) = lookup("AMEGO_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => builder = builder.timeout(Duration::from_secs(secs)),
                Err(_) => errors.push(ValidationError::new(
                    "AMEGO_TIMEOUT_SECS",
                    format!("'{secs}' is not a whole number of seconds"),
                )),
            }
        }
        if let Some(flag) = lookup("AMEGO_SKIP_TIME_SYNC") {
            builder = builder.skip_time_sync(matches!(
                flag.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ));
        }
        if let Some(level) = lookup("AMEGO_LOG_LEVEL") {
            match level.parse::<LogLevel>() {
                Ok(level) => builder = builder.log_level(level),
                Err(message) => errors.push(ValidationError::new("AMEGO_LOG_LEVEL", message)),
            }
        }

        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid environment configuration", errors));
        }
        builder.build()
    }

    /// Check every setting. Returns all validation errors found.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.tax_id.len() != 8 || !self.tax_id.bytes().all(|b| b.is_ascii_digit()) {
            errors.push(ValidationError::new("tax_id", "tax ID must be 8 digits"));
        }
        if self.app_key.is_empty() {
            errors.push(ValidationError::new("app_key", "app key is required"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            errors.push(ValidationError::new(
                "base_url",
                "base URL must start with http:// or https://",
            ));
        }
        if self.timeout.is_zero() {
            errors.push(ValidationError::new("timeout", "timeout must be greater than zero"));
        }
        if let Some(retry) = &self.retry {
            errors.extend(retry.validate().into_iter().map(|e| e.nested("retry")));
        }
        if let Some(rate_limit) = &self.rate_limit {
            errors.extend(rate_limit.validate().into_iter().map(|e| e.nested("rate_limit")));
        }

        errors
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(tax_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                tax_id: tax_id.into(),
                app_key: app_key.into(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: DEFAULT_TIMEOUT,
                skip_time_sync: false,
                retry: Some(RetryConfig::default()),
                rate_limit: None,
                logging: LoggingConfig::default(),
            },
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn skip_time_sync(mut self, skip: bool) -> Self {
        self.config.skip_time_sync = skip;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = Some(rate_limit);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    pub fn build(self) -> Result<ClientConfig, AmegoError> {
        let errors = self.config.validate();
        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid client configuration", errors));
        }
        Ok(self.config)
    }
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Vendor error codes that are safe to retry.
    pub retryable_codes: Vec<i64>,
    /// Retry on network failures and timeouts.
    pub retry_network_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            retryable_codes: Vec::new(),
            retry_network_errors: true,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.max_delay < self.base_delay {
            errors.push(ValidationError::new(
                "max_delay",
                "max_delay must not be smaller than base_delay",
            ));
        }
        errors
    }
}

/// Token bucket settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    /// Bucket capacity.
    pub burst_size: u32,
    /// Queue requests while the bucket is empty instead of failing them.
    pub queue_requests: bool,
    pub max_queue_size: usize,
}

impl RateLimitConfig {
    /// `burst_size` defaults to twice the rate, with queueing on and room
    /// for 100 waiters.
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
            burst_size: (requests_per_second * 2.0).ceil().max(1.0) as u32,
            queue_requests: true,
            max_queue_size: 100,
        }
    }

    pub fn burst_size(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }

    pub fn queue_requests(mut self, queue: bool) -> Self {
        self.queue_requests = queue;
        self
    }

    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !(self.requests_per_second.is_finite() && self.requests_per_second > 0.0) {
            errors.push(ValidationError::new(
                "requests_per_second",
                "rate must be greater than zero",
            ));
        }
        if self.burst_size == 0 {
            errors.push(ValidationError::new(
                "burst_size",
                "burst size must be greater than zero",
            ));
        }
        errors
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(10.0)
    }
}

/// Minimum severity of request-level log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Request logging off.
    #[default]
    None,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "none" | "off" => Ok(Self::None),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Request logging settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Mask buyer data, carrier IDs and the app key in logged payloads.
    pub mask_sensitive_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::None,
            mask_sensitive_data: true,
        }
    }
}
