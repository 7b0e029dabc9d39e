use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::*;

/// One product line of an invoice (商品項目).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductItem {
    /// Product name, at most 256 characters.
    pub description: String,
    pub quantity: Decimal,
    /// Unit of measure, at most 6 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub unit_price: Decimal,
    /// Line subtotal, `quantity × unit_price` to 7 decimal places.
    pub amount: Decimal,
    /// Line remark, at most 40 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub tax_type: ProductTaxType,
}

impl ProductItem {
    /// Taxable line with `amount = quantity × unit_price`.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit: None,
            unit_price,
            amount: super::tax::calculate_item_amount(quantity, unit_price),
            remark: None,
            tax_type: ProductTaxType::Taxable,
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }

    pub fn tax_type(mut self, tax_type: ProductTaxType) -> Self {
        self.tax_type = tax_type;
        self
    }
}

/// Payload of `/json/f0401` (開立發票).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInvoiceRequest {
    /// Merchant order ID, unique, at most 40 characters.
    pub order_id: String,
    /// Issue from a specific number track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_api_code: Option<String>,
    /// Buyer tax ID, or [`CONSUMER_BUYER_ID`] for consumers.
    pub buyer_identifier: String,
    pub buyer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_telephone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_type: Option<CarrierType>,
    /// Visible carrier code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_id1: Option<String>,
    /// Hidden carrier code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_id2: Option<String>,
    /// Donation code (捐贈碼).
    #[serde(rename = "NPOBAN", default, skip_serializing_if = "Option::is_none")]
    pub npoban: Option<String>,
    #[serde(rename = "ProductItem")]
    pub items: Vec<ProductItem>,
    pub sales_amount: Decimal,
    pub free_tax_sales_amount: Decimal,
    pub zero_tax_sales_amount: Decimal,
    pub tax_type: TaxType,
    /// `0.05` for the standard 5% rate.
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customs_clearance_mark: Option<CustomsClearanceMark>,
    /// Zero-tax reason code, 71 to 79.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_tax_rate_reason: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_vat: Option<DetailVat>,
    /// 0 keeps 7 decimals in line amounts, 1 rounds them to integers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_amount_round: Option<u8>,
    /// Thermal printer model code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_lang: Option<PrinterEncoding>,
    /// 1 prints line details, 0 does not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub print_detail: Option<u8>,
}

/// Payload of `/json/f0401_custom`: an invoice issued with a caller-chosen number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceWithNumberRequest {
    #[serde(flatten)]
    pub invoice: CreateInvoiceRequest,
    #[serde(rename = "InvoiceNumber")]
    pub invoice_number: String,
}

/// Result of issuing an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceResponse {
    pub invoice_number: Option<String>,
    /// Issue time, unix seconds.
    pub invoice_time: Option<i64>,
    pub random_number: Option<String>,
    pub barcode: Option<String>,
    pub qrcode_left: Option<String>,
    pub qrcode_right: Option<String>,
    /// Base64 encoded print layout.
    pub base64_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceStatus {
    pub invoice_number: String,
    #[serde(rename = "type")]
    pub kind: InvoiceKind,
    pub status: StatusCode,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetailItem {
    pub description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub tax_type: ProductTaxType,
}

/// Full record returned by `/json/invoice_query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub invoice_number: String,
    pub invoice_time: i64,
    #[serde(default)]
    pub random_number: String,
    pub buyer_identifier: String,
    pub buyer_name: String,
    pub seller_identifier: String,
    pub seller_name: String,
    pub tax_type: TaxType,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub sales_amount: Decimal,
    pub free_tax_sales_amount: Decimal,
    pub zero_tax_sales_amount: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Vec<InvoiceDetailItem>,
}

/// Filters for the list endpoints. Unset fields are omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Invoice lists only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_select: Option<DateSelect>,
}

impl ListOptions {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub invoice_number: String,
    pub invoice_time: i64,
    pub total_amount: Decimal,
    pub status: StatusCode,
}

/// One page of `/json/invoice_list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceList {
    #[serde(default)]
    pub data: Vec<InvoiceSummary>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// PDF layout for `/json/invoice_file`.
///
/// With a buyer tax ID: 0 = A4 full page, 1 = A4 with address + A5,
/// 2 = A4 holding two A5, 3 = A5. Without one only 0 is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadStyle(pub u8);

/// Thermal print options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    pub printer_type: u32,
    pub encoding: Option<PrinterEncoding>,
}

impl PrintOptions {
    pub fn new(printer_type: u32) -> Self {
        Self {
            printer_type,
            encoding: None,
        }
    }

    pub fn encoding(mut self, encoding: PrinterEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// Base64 print payload from the print endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintData {
    pub base64_data: Option<String>,
}
