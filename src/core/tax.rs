use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::invoice::ProductItem;
use super::types::{CONSUMER_BUYER_ID, ProductTaxType, TaxType};

/// Standard business tax rate (5%).
pub const DEFAULT_TAX_RATE: Decimal = dec!(0.05);

/// Decimal places kept on line amounts.
pub const ITEM_AMOUNT_SCALE: u32 = 7;

/// Options for [`calculate_invoice_amounts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculateOptions {
    /// Buyer carries a tax ID, so tax is split out (B2B).
    pub buyer_has_tax_id: bool,
    pub tax_rate: Decimal,
    /// Line amounts exclude tax. Defaults to tax-inclusive prices.
    pub price_exclusive: bool,
}

impl Default for CalculateOptions {
    fn default() -> Self {
        Self {
            buyer_has_tax_id: false,
            tax_rate: DEFAULT_TAX_RATE,
            price_exclusive: false,
        }
    }
}

/// Invoice-level amount fields derived from the line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceAmounts {
    pub sales_amount: Decimal,
    pub free_tax_sales_amount: Decimal,
    pub zero_tax_sales_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub tax_type: TaxType,
}

/// [`InvoiceAmounts`] plus the rate they were computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedAmounts {
    pub amounts: InvoiceAmounts,
    pub tax_rate: Decimal,
}

/// Round to whole dollars, halves away from zero in both directions
/// (`-0.5` becomes `-1`), so a negative sum rounds to the mirror of its
/// positive counterpart.
fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Compute the invoice totals from line items.
///
/// Sums are taken per product tax type and rounded to whole dollars. With a
/// tax-registered buyer, tax-inclusive sales are split as
/// `tax = sales - round(sales / (1 + rate))`, while tax-exclusive sales get
/// `tax = round(sales * rate)`. Consumer invoices carry no separate tax.
pub fn calculate_invoice_amounts(items: &[ProductItem], options: CalculateOptions) -> InvoiceAmounts {
    let mut taxable = Decimal::ZERO;
    let mut zero_rated = Decimal::ZERO;
    let mut exempt = Decimal::ZERO;

    for item in items {
        match item.tax_type {
            ProductTaxType::Taxable => taxable += item.amount,
            ProductTaxType::ZeroRated => zero_rated += item.amount,
            ProductTaxType::Exempt => exempt += item.amount,
        }
    }

    let mut sales_amount = round_whole(taxable);
    let free_tax_sales_amount = round_whole(exempt);
    let zero_tax_sales_amount = round_whole(zero_rated);
    let mut tax_amount = Decimal::ZERO;

    if options.buyer_has_tax_id && sales_amount > Decimal::ZERO {
        if options.price_exclusive {
            tax_amount = round_whole(sales_amount * options.tax_rate);
        } else {
            // A rate of -100% has no net split; such sales stay untaxed.
            if let Some(net) = sales_amount.checked_div(Decimal::ONE + options.tax_rate) {
                let net = round_whole(net);
                tax_amount = sales_amount - net;
                sales_amount = net;
            }
        }
    }

    InvoiceAmounts {
        sales_amount,
        free_tax_sales_amount,
        zero_tax_sales_amount,
        tax_amount,
        total_amount: sales_amount + free_tax_sales_amount + zero_tax_sales_amount + tax_amount,
        tax_type: determine_tax_type(items),
    }
}

/// The single product tax type shared by all items, or [`TaxType::Mixed`].
pub fn determine_tax_type(items: &[ProductItem]) -> TaxType {
    let mut types = items.iter().map(|item| item.tax_type);
    match types.next() {
        Some(first) if types.all(|t| t == first) => first.into(),
        _ => TaxType::Mixed,
    }
}

/// Tax-inclusive amount to tax-exclusive (unrounded).
pub fn to_exclusive(inclusive: Decimal, tax_rate: Decimal) -> Decimal {
    inclusive / (Decimal::ONE + tax_rate)
}

/// Tax-exclusive amount to tax-inclusive (unrounded).
pub fn to_inclusive(exclusive: Decimal, tax_rate: Decimal) -> Decimal {
    exclusive * (Decimal::ONE + tax_rate)
}

/// Line amount `quantity × unit_price` kept to 7 decimal places.
pub fn calculate_item_amount(quantity: Decimal, unit_price: Decimal) -> Decimal {
    (quantity * unit_price)
        .round_dp_with_strategy(ITEM_AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when the buyer identifier is a real 8-digit tax ID rather than
/// the consumer placeholder.
pub fn buyer_has_tax_id(buyer_identifier: &str) -> bool {
    buyer_identifier != CONSUMER_BUYER_ID && buyer_identifier.chars().count() == 8
}

/// Compute amounts for an invoice with tax-inclusive prices, inferring the
/// B2B/B2C split from the buyer identifier.
pub fn prepare_invoice_amounts(
    items: &[ProductItem],
    buyer_identifier: &str,
    tax_rate: Decimal,
) -> PreparedAmounts {
    let amounts = calculate_invoice_amounts(
        items,
        CalculateOptions {
            buyer_has_tax_id: buyer_has_tax_id(buyer_identifier),
            tax_rate,
            price_exclusive: false,
        },
    );
    PreparedAmounts { amounts, tax_rate }
}
