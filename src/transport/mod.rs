//! Request pipeline: configuration, clock sync, signing transport, retry,
//! rate limiting, request logging and batching.

mod batch;
mod config;
mod dispatcher;
mod http;
pub mod logging;
mod rate_limit;
mod retry;
pub mod time_sync;

pub use batch::*;
pub use config::*;
pub use dispatcher::Dispatcher;
pub use http::HttpTransport;
pub use logging::{RequestLogger, mask_sensitive_data};
pub use rate_limit::{RateLimitStatus, TokenBucket};
pub use retry::RetryPolicy;
pub use time_sync::{ClockOffsetCache, ClockSync, DEFAULT_OFFSET_TTL};
