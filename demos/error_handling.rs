//! Branching on the different error kinds.

use amego_invoice::*;
use rust_decimal_macros::dec;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // ── 1. Local validation: nothing is sent ──────────────────────────
    println!("=== Validation ===");
    let result = InvoiceRequestBuilder::new("")
        .buyer("2808062", "")
        .mobile_barcode("not-a-barcode")
        .add_item(ProductItem::new("Coffee", dec!(1), dec!(55)))
        .build();
    if let Err(err) = result {
        println!("  {}", err);
        for violation in err.violations() {
            println!("  - {violation}");
        }
    }

    // ── 2. Configuration errors ───────────────────────────────────────
    println!("\n=== Configuration ===");
    match ClientConfig::builder("1234", "").build() {
        Ok(_) => println!("  unexpected: config accepted"),
        Err(err) => println!("  {err}"),
    }

    // ── 3. Remote errors ──────────────────────────────────────────────
    println!("\n=== Remote ===");
    let client = match AmegoClient::from_env() {
        Ok(client) => client,
        Err(err) => {
            println!("  skipped: {err}");
            return;
        }
    };

    match client.invoice().status("ZZ00000000").await {
        Ok(status) => println!("  status: {}", status.status),
        Err(err) if err.is_signature_error() => {
            println!("  signature rejected after resync; check AMEGO_APP_KEY")
        }
        Err(err) => match err.kind() {
            ErrorKind::Api => println!("  API error {:?}: {err}", err.api_code()),
            ErrorKind::Network | ErrorKind::Timeout => println!("  transport: {err}"),
            ErrorKind::RateLimitExceeded => println!("  throttled: {err}"),
            _ => println!("  other: {err}"),
        },
    }
}
