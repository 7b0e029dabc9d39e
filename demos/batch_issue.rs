//! Issue a batch of consumer invoices with bounded concurrency, rate
//! limiting and progress output.

use std::time::Duration;

use amego_invoice::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AmegoError> {
    let mut config = ClientConfig::from_env()?;
    config.rate_limit = Some(RateLimitConfig::new(5.0));
    config.retry = Some(RetryConfig {
        max_retries: 2,
        base_delay: Duration::from_millis(500),
        ..RetryConfig::default()
    });
    let client = AmegoClient::new(config)?;

    let run = chrono::Utc::now().timestamp();
    let mut requests = Vec::new();
    for i in 1..=20 {
        let request = InvoiceRequestBuilder::new(format!("BATCH-{run}-{i:02}"))
            .add_item(ProductItem::new("Lunch box", dec!(1), Decimal::from(80 + i)))
            .build()?;
        requests.push(request);
    }

    let batch = BatchConfig::new()
        .concurrency(4)
        .on_progress(|p| {
            println!(
                "[{}/{}] {} ok, {} failed ({})",
                p.completed,
                p.total,
                p.successful,
                p.failed,
                p.current.as_deref().unwrap_or("-")
            );
        });

    let result = client.invoice().create_many(requests, batch).await;

    for failure in &result.failed {
        println!(
            "#{} {} failed: {}",
            failure.index, failure.input.order_id, failure.error
        );
    }
    println!("{} of {} issued", result.success.len(), result.total);
    Ok(())
}
