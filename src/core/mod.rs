//! Core e-invoice types, tax computation, validation, and request signing.
//!
//! Everything here is synchronous and free of I/O; the `client` feature
//! builds the HTTP pipeline on top of it.

mod allowance;
mod builder;
mod error;
mod invoice;
mod lookup;
pub mod signature;
pub mod tax;
mod types;
mod validation;

pub use allowance::*;
pub use builder::*;
pub use error::*;
pub use invoice::*;
pub use lookup::*;
pub use signature::{SignedRequest, sign};
pub use tax::{
    CalculateOptions, DEFAULT_TAX_RATE, InvoiceAmounts, PreparedAmounts, calculate_invoice_amounts,
    prepare_invoice_amounts,
};
pub use types::*;
pub use validation::*;
