use std::sync::Arc;

use super::allowance::AllowanceOperations;
use super::invoice::InvoiceOperations;
use super::utility::UtilityOperations;
use crate::core::AmegoError;
use crate::transport::{
    BatchConfig, BatchExecutor, ClientConfig, ClockOffsetCache, Dispatcher, RateLimitStatus,
};

/// Entry point of the SDK.
///
/// Cloning is cheap: clones share the dispatcher, and with it the rate
/// limiter and connection pool.
///
/// ```no_run
/// # async fn run() -> Result<(), amego_invoice::AmegoError> {
/// use amego_invoice::{AmegoClient, ClientConfig};
///
/// let client = AmegoClient::new(ClientConfig::builder("12345678", "app-key").build()?)?;
/// let status = client.invoice().status("AB12345678").await?;
/// println!("{}", status.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AmegoClient {
    dispatcher: Arc<Dispatcher>,
}

impl AmegoClient {
    /// Client using the process-wide clock offset cache.
    pub fn new(config: ClientConfig) -> Result<Self, AmegoError> {
        Ok(Self {
            dispatcher: Arc::new(Dispatcher::new(config)?),
        })
    }

    /// Client with its own clock offset cache.
    pub fn with_clock_cache(
        config: ClientConfig,
        cache: ClockOffsetCache,
    ) -> Result<Self, AmegoError> {
        Ok(Self {
            dispatcher: Arc::new(Dispatcher::with_clock_cache(config, cache)?),
        })
    }

    /// Client configured from `AMEGO_*` environment variables.
    pub fn from_env() -> Result<Self, AmegoError> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn invoice(&self) -> InvoiceOperations<'_> {
        InvoiceOperations::new(&self.dispatcher)
    }

    pub fn allowance(&self) -> AllowanceOperations<'_> {
        AllowanceOperations::new(&self.dispatcher)
    }

    pub fn utility(&self) -> UtilityOperations<'_> {
        UtilityOperations::new(&self.dispatcher)
    }

    /// Executor for running any operation over many inputs, e.g.
    /// cancelling a list of invoices with bounded concurrency.
    pub fn batch(&self, config: BatchConfig) -> BatchExecutor {
        BatchExecutor::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    /// Limiter state, or `None` when rate limiting is off.
    pub fn rate_limit_status(&self) -> Option<RateLimitStatus> {
        self.dispatcher.rate_limit_status()
    }

    /// Round trip to the time endpoint to confirm the API is reachable.
    pub async fn ping(&self) -> Result<(), AmegoError> {
        self.utility().server_time().await.map(|_| ())
    }
}
