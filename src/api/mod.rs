//! High-level client and the invoice, allowance and utility operation groups.

mod allowance;
mod client;
mod invoice;
mod utility;
mod wire;

pub use allowance::AllowanceOperations;
pub use client::AmegoClient;
pub use invoice::InvoiceOperations;
pub use utility::UtilityOperations;
