use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::*;

/// One line of an allowance (credit note), referencing the original invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllowanceItem {
    pub original_invoice_number: String,
    /// Issue date of the original invoice as the vendor prints it.
    pub original_invoice_date: String,
    pub original_description: String,
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub amount: Decimal,
    #[serde(rename = "Tax")]
    pub tax_type: ProductTaxType,
}

/// Payload of `/json/g0401` (開立折讓).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAllowanceRequest {
    pub allowance_number: String,
    pub allowance_date: NaiveDate,
    pub buyer_identifier: String,
    pub buyer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_telephone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_email_address: Option<String>,
    #[serde(rename = "ProductItem")]
    pub items: Vec<AllowanceItem>,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAllowanceResponse {
    pub allowance_number: Option<String>,
    /// Issue time, unix seconds.
    pub allowance_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceStatus {
    pub allowance_number: String,
    pub status: StatusCode,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceDetailItem {
    pub original_invoice_number: String,
    pub original_description: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub tax: ProductTaxType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceDetail {
    pub allowance_number: String,
    pub allowance_time: i64,
    pub buyer_identifier: String,
    pub buyer_name: String,
    pub seller_identifier: String,
    pub seller_name: String,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub items: Vec<AllowanceDetailItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowanceSummary {
    pub allowance_number: String,
    pub allowance_time: i64,
    pub total_amount: Decimal,
    pub status: StatusCode,
}

/// One page of `/json/allowance_list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowanceList {
    #[serde(default)]
    pub data: Vec<AllowanceSummary>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
