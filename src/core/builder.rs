use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::allowance::{AllowanceItem, CreateAllowanceRequest};
use super::error::AmegoError;
use super::invoice::{CreateInvoiceRequest, ProductItem};
use super::tax::{self, CalculateOptions, DEFAULT_TAX_RATE};
use super::types::*;
use super::validation;

/// Builder for invoice requests with every amount field filled in.
///
/// ```
/// use amego_invoice::core::*;
/// use rust_decimal_macros::dec;
///
/// let request = InvoiceRequestBuilder::new("ORDER-2024-001")
///     .buyer("28080623", "光貿科技有限公司")
///     .add_item(ProductItem::new("測試商品", dec!(1), dec!(168)).unit("個"))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.tax_amount, dec!(8));
/// assert_eq!(request.sales_amount, dec!(160));
/// assert_eq!(request.total_amount, dec!(168));
/// ```
pub struct InvoiceRequestBuilder {
    order_id: String,
    track_api_code: Option<String>,
    buyer_identifier: String,
    buyer_name: String,
    buyer_address: Option<String>,
    buyer_telephone_number: Option<String>,
    buyer_email_address: Option<String>,
    main_remark: Option<String>,
    carrier: Option<(CarrierType, String, String)>,
    npoban: Option<String>,
    items: Vec<ProductItem>,
    tax_rate: Decimal,
    price_exclusive: bool,
    customs_clearance_mark: Option<CustomsClearanceMark>,
    zero_tax_rate_reason: Option<u8>,
    brand_name: Option<String>,
    detail_amount_round: Option<u8>,
    printer: Option<(u32, Option<PrinterEncoding>)>,
    print_detail: Option<bool>,
}

impl InvoiceRequestBuilder {
    /// Start a consumer (B2C) invoice; call [`buyer`](Self::buyer) for B2B.
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            track_api_code: None,
            buyer_identifier: CONSUMER_BUYER_ID.to_string(),
            buyer_name: CONSUMER_BUYER_NAME.to_string(),
            buyer_address: None,
            buyer_telephone_number: None,
            buyer_email_address: None,
            main_remark: None,
            carrier: None,
            npoban: None,
            items: Vec::new(),
            tax_rate: DEFAULT_TAX_RATE,
            price_exclusive: false,
            customs_clearance_mark: None,
            zero_tax_rate_reason: None,
            brand_name: None,
            detail_amount_round: None,
            printer: None,
            print_detail: None,
        }
    }

    pub fn buyer(mut self, identifier: impl Into<String>, name: impl Into<String>) -> Self {
        self.buyer_identifier = identifier.into();
        self.buyer_name = name.into();
        self
    }

    pub fn buyer_address(mut self, address: impl Into<String>) -> Self {
        self.buyer_address = Some(address.into());
        self
    }

    pub fn buyer_phone(mut self, phone: impl Into<String>) -> Self {
        self.buyer_telephone_number = Some(phone.into());
        self
    }

    pub fn buyer_email(mut self, email: impl Into<String>) -> Self {
        self.buyer_email_address = Some(email.into());
        self
    }

    pub fn main_remark(mut self, remark: impl Into<String>) -> Self {
        self.main_remark = Some(remark.into());
        self
    }

    pub fn track_api_code(mut self, code: impl Into<String>) -> Self {
        self.track_api_code = Some(code.into());
        self
    }

    /// Store the invoice on a mobile barcode carrier (手機條碼).
    pub fn mobile_barcode(mut self, barcode: impl Into<String>) -> Self {
        let barcode = barcode.into();
        self.carrier = Some((CarrierType::MobileBarcode, barcode.clone(), barcode));
        self
    }

    /// Store the invoice on a natural person certificate (自然人憑證).
    pub fn citizen_certificate(mut self, cert_id: impl Into<String>) -> Self {
        let cert_id = cert_id.into();
        self.carrier = Some((CarrierType::CitizenCertificate, cert_id.clone(), cert_id));
        self
    }

    /// Store the invoice on an Amego member carrier.
    pub fn member_carrier(mut self, visible: impl Into<String>, hidden: impl Into<String>) -> Self {
        self.carrier = Some((CarrierType::Member, visible.into(), hidden.into()));
        self
    }

    /// Donate the invoice to the charity with this code (捐贈碼).
    pub fn donate(mut self, npoban: impl Into<String>) -> Self {
        self.npoban = Some(npoban.into());
        self
    }

    pub fn add_item(mut self, item: ProductItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = ProductItem>) -> Self {
        self.items.extend(items);
        self
    }

    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Line prices exclude tax (`DetailVat = 0`).
    pub fn price_exclusive(mut self, exclusive: bool) -> Self {
        self.price_exclusive = exclusive;
        self
    }

    /// Zero-rated export with its clearance route and reason code (71 to 79).
    pub fn zero_tax(mut self, mark: CustomsClearanceMark, reason: u8) -> Self {
        self.customs_clearance_mark = Some(mark);
        self.zero_tax_rate_reason = Some(reason);
        self
    }

    pub fn brand_name(mut self, name: impl Into<String>) -> Self {
        self.brand_name = Some(name.into());
        self
    }

    /// Round line amounts to whole numbers on the vendor side.
    pub fn round_line_amounts(mut self, round: bool) -> Self {
        self.detail_amount_round = Some(u8::from(round));
        self
    }

    /// Print on a thermal printer after issuing.
    pub fn printer(mut self, printer_type: u32, encoding: Option<PrinterEncoding>) -> Self {
        self.printer = Some((printer_type, encoding));
        self
    }

    pub fn print_detail(mut self, print: bool) -> Self {
        self.print_detail = Some(print);
        self
    }

    /// Compute amounts, assemble the request and validate it.
    pub fn build(self) -> Result<CreateInvoiceRequest, AmegoError> {
        validation::validate_tax_rate(self.tax_rate)
            .map_err(|err| AmegoError::validation("Invalid invoice request", vec![err]))?;

        let amounts = tax::calculate_invoice_amounts(
            &self.items,
            CalculateOptions {
                buyer_has_tax_id: tax::buyer_has_tax_id(&self.buyer_identifier),
                tax_rate: self.tax_rate,
                price_exclusive: self.price_exclusive,
            },
        );

        let (carrier_type, carrier_id1, carrier_id2) = match self.carrier {
            Some((kind, visible, hidden)) => (Some(kind), Some(visible), Some(hidden)),
            None => (None, None, None),
        };
        let detail_vat = if self.price_exclusive {
            DetailVat::Exclusive
        } else {
            DetailVat::Inclusive
        };

        let request = CreateInvoiceRequest {
            order_id: self.order_id,
            track_api_code: self.track_api_code,
            buyer_identifier: self.buyer_identifier,
            buyer_name: self.buyer_name,
            buyer_address: self.buyer_address,
            buyer_telephone_number: self.buyer_telephone_number,
            buyer_email_address: self.buyer_email_address,
            main_remark: self.main_remark,
            carrier_type,
            carrier_id1,
            carrier_id2,
            npoban: self.npoban,
            items: self.items,
            sales_amount: amounts.sales_amount,
            free_tax_sales_amount: amounts.free_tax_sales_amount,
            zero_tax_sales_amount: amounts.zero_tax_sales_amount,
            tax_type: amounts.tax_type,
            tax_rate: self.tax_rate,
            tax_amount: amounts.tax_amount,
            total_amount: amounts.total_amount,
            customs_clearance_mark: self.customs_clearance_mark,
            zero_tax_rate_reason: self.zero_tax_rate_reason,
            brand_name: self.brand_name,
            detail_vat: Some(detail_vat),
            detail_amount_round: self.detail_amount_round,
            printer_type: self.printer.map(|(printer_type, _)| printer_type),
            printer_lang: self.printer.and_then(|(_, encoding)| encoding),
            print_detail: self.print_detail.map(u8::from),
        };

        let errors = validation::validate_invoice_request(&request);
        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid invoice request", errors));
        }

        Ok(request)
    }
}

/// Builder for allowance (credit note) requests.
///
/// Line amounts are tax-exclusive; `TotalAmount` is their rounded sum and
/// `TaxAmount` is the tax on the taxable part, unless set explicitly.
pub struct AllowanceRequestBuilder {
    allowance_number: String,
    allowance_date: NaiveDate,
    buyer_identifier: String,
    buyer_name: String,
    buyer_address: Option<String>,
    buyer_telephone_number: Option<String>,
    buyer_email_address: Option<String>,
    items: Vec<AllowanceItem>,
    tax_rate: Decimal,
    tax_amount: Option<Decimal>,
    total_amount: Option<Decimal>,
}

impl AllowanceRequestBuilder {
    pub fn new(allowance_number: impl Into<String>, allowance_date: NaiveDate) -> Self {
        Self {
            allowance_number: allowance_number.into(),
            allowance_date,
            buyer_identifier: CONSUMER_BUYER_ID.to_string(),
            buyer_name: CONSUMER_BUYER_NAME.to_string(),
            buyer_address: None,
            buyer_telephone_number: None,
            buyer_email_address: None,
            items: Vec::new(),
            tax_rate: DEFAULT_TAX_RATE,
            tax_amount: None,
            total_amount: None,
        }
    }

    pub fn buyer(mut self, identifier: impl Into<String>, name: impl Into<String>) -> Self {
        self.buyer_identifier = identifier.into();
        self.buyer_name = name.into();
        self
    }

    pub fn buyer_address(mut self, address: impl Into<String>) -> Self {
        self.buyer_address = Some(address.into());
        self
    }

    pub fn buyer_phone(mut self, phone: impl Into<String>) -> Self {
        self.buyer_telephone_number = Some(phone.into());
        self
    }

    pub fn buyer_email(mut self, email: impl Into<String>) -> Self {
        self.buyer_email_address = Some(email.into());
        self
    }

    pub fn add_item(mut self, item: AllowanceItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Override the computed tax and total.
    pub fn amounts(mut self, tax_amount: Decimal, total_amount: Decimal) -> Self {
        self.tax_amount = Some(tax_amount);
        self.total_amount = Some(total_amount);
        self
    }

    pub fn build(self) -> Result<CreateAllowanceRequest, AmegoError> {
        validation::validate_tax_rate(self.tax_rate)
            .map_err(|err| AmegoError::validation("Invalid allowance request", vec![err]))?;

        let round = |value: Decimal| {
            value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        };
        let taxable: Decimal = self
            .items
            .iter()
            .filter(|item| item.tax_type == ProductTaxType::Taxable)
            .map(|item| item.amount)
            .sum();
        let total: Decimal = self.items.iter().map(|item| item.amount).sum();

        let request = CreateAllowanceRequest {
            allowance_number: self.allowance_number,
            allowance_date: self.allowance_date,
            buyer_identifier: self.buyer_identifier,
            buyer_name: self.buyer_name,
            buyer_address: self.buyer_address,
            buyer_telephone_number: self.buyer_telephone_number,
            buyer_email_address: self.buyer_email_address,
            items: self.items,
            tax_amount: self
                .tax_amount
                .unwrap_or_else(|| round(taxable * self.tax_rate)),
            total_amount: self.total_amount.unwrap_or_else(|| round(total)),
        };

        let errors = validation::validate_allowance_request(&request);
        if !errors.is_empty() {
            return Err(AmegoError::validation("Invalid allowance request", errors));
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn consumer_invoice_defaults() {
        let request = InvoiceRequestBuilder::new("A-1")
            .add_item(ProductItem::new("咖啡", dec!(2), dec!(55)))
            .build()
            .unwrap();
        assert_eq!(request.buyer_identifier, CONSUMER_BUYER_ID);
        assert_eq!(request.buyer_name, CONSUMER_BUYER_NAME);
        assert_eq!(request.total_amount, dec!(110));
        assert_eq!(request.tax_amount, Decimal::ZERO);
        assert_eq!(request.detail_vat, Some(DetailVat::Inclusive));
    }

    #[test]
    fn mobile_barcode_fills_both_carrier_ids() {
        let request = InvoiceRequestBuilder::new("A-2")
            .mobile_barcode("/ABC1234")
            .add_item(ProductItem::new("咖啡", dec!(1), dec!(55)))
            .build()
            .unwrap();
        assert_eq!(request.carrier_type, Some(CarrierType::MobileBarcode));
        assert_eq!(request.carrier_id1.as_deref(), Some("/ABC1234"));
        assert_eq!(request.carrier_id2.as_deref(), Some("/ABC1234"));
    }

    #[test]
    fn invalid_request_reports_every_problem() {
        let err = InvoiceRequestBuilder::new("")
            .mobile_barcode("ABC")
            .build()
            .unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"OrderId"));
        assert!(fields.contains(&"CarrierId1"));
        assert!(fields.contains(&"ProductItem"));
    }

    #[test]
    fn exclusive_prices_add_tax_for_b2b() {
        let request = InvoiceRequestBuilder::new("A-3")
            .buyer("28080623", "光貿科技有限公司")
            .price_exclusive(true)
            .add_item(ProductItem::new("顧問服務", dec!(10), dec!(100)))
            .build()
            .unwrap();
        assert_eq!(request.sales_amount, dec!(1000));
        assert_eq!(request.tax_amount, dec!(50));
        assert_eq!(request.total_amount, dec!(1050));
        assert_eq!(request.detail_vat, Some(DetailVat::Exclusive));
    }

    #[test]
    fn allowance_computes_tax_on_taxable_lines() {
        let request = AllowanceRequestBuilder::new(
            "AL-1",
            NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
        )
        .buyer("28080623", "光貿科技有限公司")
        .add_item(AllowanceItem {
            original_invoice_number: "AB12345678".into(),
            original_invoice_date: "20240615".into(),
            original_description: "退貨".into(),
            quantity: dec!(2),
            unit: None,
            unit_price: dec!(100),
            amount: dec!(200),
            tax_type: ProductTaxType::Taxable,
        })
        .build()
        .unwrap();
        assert_eq!(request.tax_amount, dec!(10));
        assert_eq!(request.total_amount, dec!(200));
    }
}
