//! Signed request pipeline.
//!
//! Every call runs: log request, rate-limit admission, then under the retry
//! policy: timestamp, sign, POST, interpret the envelope. A signature or
//! clock rejection (codes 2, 3, 15) triggers one forced clock resync and
//! a single resend before the error is surfaced.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::{ClientConfig, LogLevel};
use super::http::HttpTransport;
use super::logging::RequestLogger;
use super::rate_limit::{RateLimitStatus, TokenBucket};
use super::retry::RetryPolicy;
use super::time_sync::{ClockOffsetCache, ClockSync};
use crate::core::{AmegoError, SIGNATURE_ERROR_CODES, SignedRequest};

/// Sends signed requests to the API.
#[derive(Debug)]
pub struct Dispatcher {
    config: ClientConfig,
    transport: HttpTransport,
    clock: ClockSync,
    limiter: Option<TokenBucket>,
    retry: Option<RetryPolicy>,
    logger: RequestLogger,
}

impl Dispatcher {
    /// Dispatcher using the process-wide clock offset cache.
    pub fn new(config: ClientConfig) -> Result<Self, AmegoError> {
        Self::with_clock_cache(config, ClockOffsetCache::shared())
    }

    pub fn with_clock_cache(
        config: ClientConfig,
        cache: ClockOffsetCache,
    ) -> Result<Self, AmegoError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid client configuration", errors));
        }

        let transport = HttpTransport::new(&config.base_url, config.timeout)?;
        let clock = ClockSync::new(transport.clone(), cache);
        let limiter = config.rate_limit.as_ref().map(TokenBucket::new);
        let retry = config
            .retry
            .clone()
            .filter(|retry| retry.max_retries > 0)
            .map(RetryPolicy::new);
        let logger = RequestLogger::new(config.logging);

        Ok(Self {
            config,
            transport,
            clock,
            limiter,
            retry,
            logger,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn rate_limit_status(&self) -> Option<RateLimitStatus> {
        self.limiter.as_ref().map(TokenBucket::status)
    }

    /// POST a signed `payload` to `endpoint` and decode the response body.
    pub async fn send<P, R>(&self, endpoint: &str, payload: &P) -> Result<R, AmegoError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let json = serde_json::to_string(payload).map_err(|e| {
            AmegoError::validation(
                format!("payload for {endpoint} is not serializable: {e}"),
                Vec::new(),
            )
        })?;
        if self.logger.should_log(LogLevel::Debug) {
            let value = serde_json::from_str(&json).unwrap_or(Value::Null);
            self.logger.log_request("POST", endpoint, &value);
        }

        let result: Result<R, AmegoError> = async {
            self.admit(endpoint).await?;
            let body = match &self.retry {
                Some(policy) => {
                    policy
                        .execute_with_hook(
                            || self.send_signed(endpoint, &json),
                            |attempt, delay, _| self.logger.log_retry(endpoint, attempt, delay),
                        )
                        .await?
                }
                None => self.send_signed(endpoint, &json).await?,
            };
            decode(endpoint, body)
        }
        .await;

        if let Err(err) = &result {
            self.logger.log_error(endpoint, err);
        }
        result
    }

    /// Unsigned GET through the same limiter, retry and logging layers.
    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, AmegoError> {
        self.logger.log_request("GET", endpoint, &Value::Null);

        let result: Result<R, AmegoError> = async {
            self.admit(endpoint).await?;
            let fetch = move || async move {
                let (status, body) = self.transport.get_json(endpoint).await?;
                self.logger.log_response(endpoint, status, &body);
                Ok::<Value, AmegoError>(body)
            };
            let body = match &self.retry {
                Some(policy) => {
                    policy
                        .execute_with_hook(fetch, |attempt, delay, _| {
                            self.logger.log_retry(endpoint, attempt, delay)
                        })
                        .await?
                }
                None => fetch().await?,
            };
            decode(endpoint, body)
        }
        .await;

        if let Err(err) = &result {
            self.logger.log_error(endpoint, err);
        }
        result
    }

    async fn admit(&self, endpoint: &str) -> Result<(), AmegoError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        if limiter.try_acquire() {
            return Ok(());
        }
        if limiter.can_queue() {
            self.logger
                .log_rate_limit(endpoint, limiter.status().queue_length + 1);
        }
        limiter.acquire().await
    }

    /// One signed round trip, plus at most one resend after a clock resync.
    async fn send_signed(&self, endpoint: &str, json: &str) -> Result<Value, AmegoError> {
        let mut resynced = false;

        loop {
            let timestamp = self
                .clock
                .current_timestamp(self.config.skip_time_sync)
                .await?;
            let signed = SignedRequest::new(json.to_string(), timestamp, &self.config.app_key);
            let (status, body) = self
                .transport
                .post_form(endpoint, &signed.form_fields(&self.config.tax_id))
                .await?;
            self.logger.log_response(endpoint, status, &body);

            let code = envelope_code(&body);
            if code == 0 {
                return Ok(body);
            }

            if !resynced && SIGNATURE_ERROR_CODES.contains(&code) {
                self.logger.log_resync(endpoint, code);
                if !self.config.skip_time_sync {
                    self.clock.force_resync().await?;
                }
                resynced = true;
                continue;
            }

            let message = body
                .get("msg")
                .and_then(Value::as_str)
                .filter(|msg| !msg.is_empty())
                .unwrap_or("Unknown API error")
                .to_string();
            return Err(AmegoError::Api {
                code,
                message,
                response: body,
            });
        }
    }
}

/// Status code from the response envelope; a missing code counts as success.
fn envelope_code(body: &Value) -> i64 {
    match body.get("code") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(-1),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(-1),
        _ => 0,
    }
}

fn decode<R: DeserializeOwned>(endpoint: &str, body: Value) -> Result<R, AmegoError> {
    serde_json::from_value(body)
        .map_err(|e| AmegoError::InvalidResponse(format!("{endpoint}: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::config::RetryConfig;

    #[test]
    fn envelope_code_variants() {
        assert_eq!(envelope_code(&json!({"code": 0, "msg": ""})), 0);
        assert_eq!(envelope_code(&json!({"code": 15})), 15);
        assert_eq!(envelope_code(&json!({"code": "3"})), 3);
        assert_eq!(envelope_code(&json!({"timestamp": 1})), 0);
        assert_eq!(envelope_code(&json!({"code": 1.5})), -1);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = ClientConfig::builder("12345678", "key").build().unwrap();
        config.app_key.clear();
        let err = Dispatcher::with_clock_cache(config, ClockOffsetCache::default()).unwrap_err();
        assert_eq!(err.violations()[0].field, "app_key");
    }

    #[test]
    fn zero_retries_disables_policy() {
        let config = ClientConfig::builder("12345678", "key")
            .retry(RetryConfig {
                max_retries: 0,
                ..Default::default()
            })
            .build()
            .unwrap();
        let dispatcher = Dispatcher::with_clock_cache(config, ClockOffsetCache::default()).unwrap();
        assert!(dispatcher.retry.is_none());
        assert!(dispatcher.rate_limit_status().is_none());
    }
}
