//! Issue a B2B invoice and read it back.
//!
//! Needs `AMEGO_TAX_ID` and `AMEGO_APP_KEY`; point `AMEGO_BASE_URL` at a
//! sandbox before running against real credentials.

use amego_invoice::*;
use rust_decimal_macros::dec;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AmegoError> {
    let client = AmegoClient::from_env()?;

    let request = InvoiceRequestBuilder::new(format!("DEMO-{}", chrono::Utc::now().timestamp()))
        .buyer("28080623", "光貿科技有限公司")
        .buyer_email("billing@example.com")
        .add_item(ProductItem::new("Consulting", dec!(2), dec!(1050)).unit("hr"))
        .add_item(ProductItem::new("Travel", dec!(1), dec!(315)))
        .main_remark("Demo invoice")
        .build()?;

    println!(
        "sales {}  tax {}  total {}",
        request.sales_amount, request.tax_amount, request.total_amount
    );

    let issued = client.invoice().create(&request).await?;
    let Some(number) = issued.invoice_number else {
        println!("issued, but no invoice number returned");
        return Ok(());
    };
    println!("issued {number}");

    let status = client.invoice().status(&number).await?;
    println!("status: {}", status.status);

    let pdf = client.invoice().download_pdf(&number, None).await?;
    std::fs::write(format!("{number}.pdf"), &pdf)
        .map_err(|e| AmegoError::InvalidResponse(e.to_string()))?;
    println!("wrote {number}.pdf ({} bytes)", pdf.len());

    Ok(())
}
