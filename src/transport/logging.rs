//! Request-level logging with sensitive-field masking.
//!
//! Events go through `tracing`; the SDK never installs a subscriber. On top
//! of the subscriber's own filter, [`RequestLogger`] gates events by the
//! configured [`LogLevel`], which defaults to off.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::config::{LogLevel, LoggingConfig};
use crate::core::AmegoError;

/// Payload keys whose string values are masked before logging.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "appKey",
    "app_key",
    "BuyerIdentifier",
    "BuyerName",
    "BuyerAddress",
    "BuyerPhone",
    "BuyerTelephoneNumber",
    "BuyerEmail",
    "BuyerEmailAddress",
    "CarrierId1",
    "CarrierId2",
    "NPOBAN",
];

/// Mask a string: up to 6 characters become `***`, longer values keep
/// their first and last 3 characters.
pub fn mask_string(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{head}***{tail}")
}

/// Copy of `data` with every sensitive string field masked, at any depth.
pub fn mask_sensitive_data(data: &Value) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let masked = match value {
                        Value::String(s) if SENSITIVE_FIELDS.contains(&key.as_str()) => {
                            Value::String(mask_string(s))
                        }
                        other => mask_sensitive_data(other),
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive_data).collect()),
        other => other.clone(),
    }
}

/// Level-gated request logger.
#[derive(Debug, Clone, Copy)]
pub struct RequestLogger {
    config: LoggingConfig,
}

impl RequestLogger {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        self.config.level != LogLevel::None && level >= self.config.level
    }

    fn render(&self, data: &Value) -> String {
        if self.config.mask_sensitive_data {
            mask_sensitive_data(data).to_string()
        } else {
            data.to_string()
        }
    }

    pub fn log_request(&self, method: &str, endpoint: &str, payload: &Value) {
        if self.should_log(LogLevel::Debug) {
            debug!(method, endpoint, payload = %self.render(payload), "Request");
        }
    }

    pub fn log_response(&self, endpoint: &str, status: u16, body: &Value) {
        if self.should_log(LogLevel::Debug) {
            debug!(endpoint, status, body = %self.render(body), "Response");
        }
    }

    pub fn log_error(&self, endpoint: &str, err: &AmegoError) {
        if self.should_log(LogLevel::Error) {
            error!(endpoint, kind = ?err.kind(), error = %err, "Request failed");
        }
    }

    pub fn log_retry(&self, endpoint: &str, attempt: u32, delay: Duration) {
        if self.should_log(LogLevel::Warn) {
            warn!(endpoint, attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
        }
    }

    pub fn log_rate_limit(&self, endpoint: &str, queue_length: usize) {
        if self.should_log(LogLevel::Warn) {
            warn!(endpoint, queue_length, "Rate limited, request queued");
        }
    }

    pub fn log_resync(&self, endpoint: &str, code: i64) {
        if self.should_log(LogLevel::Info) {
            info!(endpoint, code, "Signature rejected, resyncing clock");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn short_values_are_fully_masked() {
        assert_eq!(mask_string("919"), "***");
        assert_eq!(mask_string("123456"), "***");
        assert_eq!(mask_string(""), "***");
    }

    #[test]
    fn long_values_keep_edges() {
        assert_eq!(mask_string("28080623"), "280***623");
        assert_eq!(mask_string("/ABC1234"), "/AB***234");
        assert_eq!(mask_string("光貿科技有限公司"), "光貿科***限公司");
    }

    #[test]
    fn masks_nested_fields_only() {
        let payload = json!({
            "OrderId": "ORDER-0001",
            "BuyerIdentifier": "28080623",
            "BuyerName": "王小明",
            "NPOBAN": "919",
            "ProductItem": [{ "Description": "咖啡", "CarrierId1": "/ABC1234" }],
            "appKey": "abcdefghijklmnop",
            "TotalAmount": 168
        });
        let masked = mask_sensitive_data(&payload);
        assert_eq!(masked["OrderId"], "ORDER-0001");
        assert_eq!(masked["BuyerIdentifier"], "280***623");
        assert_eq!(masked["BuyerName"], "***");
        assert_eq!(masked["NPOBAN"], "***");
        assert_eq!(masked["ProductItem"][0]["Description"], "咖啡");
        assert_eq!(masked["ProductItem"][0]["CarrierId1"], "/AB***234");
        assert_eq!(masked["appKey"], "abc***nop");
        assert_eq!(masked["TotalAmount"], 168);
    }

    #[test]
    fn non_string_sensitive_values_are_left_alone() {
        let masked = mask_sensitive_data(&json!({ "BuyerIdentifier": 28080623 }));
        assert_eq!(masked["BuyerIdentifier"], 28080623);
    }

    #[test]
    fn level_gating() {
        let off = RequestLogger::new(LoggingConfig::default());
        assert!(!off.should_log(LogLevel::Error));

        let warn = RequestLogger::new(LoggingConfig {
            level: LogLevel::Warn,
            mask_sensitive_data: true,
        });
        assert!(!warn.should_log(LogLevel::Debug));
        assert!(warn.should_log(LogLevel::Warn));
        assert!(warn.should_log(LogLevel::Error));
    }

    #[test]
    fn masking_can_be_disabled() {
        let logger = RequestLogger::new(LoggingConfig {
            level: LogLevel::Debug,
            mask_sensitive_data: false,
        });
        let rendered = logger.render(&json!({ "BuyerName": "王小明" }));
        assert!(rendered.contains("王小明"));
    }
}
