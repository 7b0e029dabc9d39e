//! # amego-invoice
//!
//! Client SDK for the Amego (光貿) Taiwan e-invoice API: issuing, cancelling
//! and querying invoices and allowances, plus carrier, company, lottery and
//! number-track lookups.
//!
//! Every request is signed with `md5(payload + timestamp + app_key)` using a
//! timestamp aligned to the server clock. The client retries transient
//! failures with exponential backoff, can throttle itself with a token
//! bucket, and resyncs its clock once when the API rejects a signature.
//!
//! All monetary values use [`rust_decimal::Decimal`].
//!
//! ## Quick Start
//!
//! ```rust
//! use amego_invoice::core::*;
//! use rust_decimal_macros::dec;
//!
//! let request = InvoiceRequestBuilder::new("ORDER-001")
//!     .buyer("28080623", "光貿科技有限公司")
//!     .add_item(ProductItem::new("Consulting", dec!(1), dec!(168)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.tax_amount, dec!(8));
//! assert_eq!(request.sales_amount, dec!(160));
//! assert_eq!(request.total_amount, dec!(168));
//! ```
//!
//! With the `client` feature:
//!
//! ```no_run
//! # async fn run() -> Result<(), amego_invoice::AmegoError> {
//! use amego_invoice::{AmegoClient, ClientConfig, RateLimitConfig};
//!
//! let config = ClientConfig::builder("12345678", "app-key")
//!     .rate_limit(RateLimitConfig::new(5.0))
//!     .build()?;
//! let client = AmegoClient::new(config)?;
//! let company = client.utility().query_company("28080623").await?;
//! println!("{:?}", company.name);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Request types, tax calculation, validation, signing |
//! | `client` (default) | HTTP pipeline, clock sync, retry, rate limiting, batching |
//! | `cli` | The `amego-invoice` command-line tool |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "client")]
pub mod transport;

#[cfg(feature = "client")]
pub mod api;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

#[cfg(feature = "client")]
pub use crate::api::*;

#[cfg(feature = "client")]
pub use crate::transport::{
    BatchConfig, BatchExecutor, BatchFailure, BatchProgress, BatchResult, ClientConfig,
    ClientConfigBuilder, ClockOffsetCache, LogLevel, LoggingConfig, RateLimitConfig,
    RateLimitStatus, RetryConfig,
};
