//! Offline amount calculation for consumer and business invoices.

use amego_invoice::core::tax::{to_exclusive, to_inclusive};
use amego_invoice::core::*;
use rust_decimal_macros::dec;

fn main() {
    let items = vec![
        ProductItem::new("Coffee beans", dec!(2), dec!(450)),
        ProductItem::new("Gift card", dec!(1), dec!(500)).tax_type(ProductTaxType::Exempt),
    ];

    for (label, options) in [
        ("B2C, tax-inclusive", CalculateOptions::default()),
        (
            "B2B, tax-inclusive",
            CalculateOptions {
                buyer_has_tax_id: true,
                ..CalculateOptions::default()
            },
        ),
        (
            "B2B, tax-exclusive",
            CalculateOptions {
                buyer_has_tax_id: true,
                price_exclusive: true,
                ..CalculateOptions::default()
            },
        ),
    ] {
        let amounts = calculate_invoice_amounts(&items, options);
        println!("=== {label} ===");
        println!("  tax type:     {:?}", amounts.tax_type);
        println!("  sales:        {}", amounts.sales_amount);
        println!("  exempt sales: {}", amounts.free_tax_sales_amount);
        println!("  tax:          {}", amounts.tax_amount);
        println!("  total:        {}", amounts.total_amount);
    }

    println!("\n=== Conversions at 5% ===");
    println!("  1050 inclusive -> {} exclusive", to_exclusive(dec!(1050), DEFAULT_TAX_RATE));
    println!("  1000 exclusive -> {} inclusive", to_inclusive(dec!(1000), DEFAULT_TAX_RATE));

    println!("\n=== Buyer validation ===");
    for id in ["28080623", CONSUMER_BUYER_ID, "1234"] {
        match validate_tax_id(id) {
            Ok(kind) => println!("  {id}: {kind:?}"),
            Err(e) => println!("  {id}: {e}"),
        }
    }
}
