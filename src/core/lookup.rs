use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of checking a mobile barcode against the vendor registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeValidation {
    pub valid: bool,
    pub code: i64,
    pub message: String,
    pub carrier_id1: Option<String>,
    pub carrier_id2: Option<String>,
}

/// Company name lookup by tax ID (BAN).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub found: bool,
    pub name: Option<String>,
    pub tax_id: String,
}

/// Whether an invoice won the receipt lottery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryStatus {
    /// `None` while the period has not been drawn.
    pub won: Option<bool>,
    pub prize_type: Option<u32>,
    pub prize_amount: Option<Decimal>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryPrize {
    #[serde(rename = "type")]
    pub kind: u32,
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub numbers: Vec<String>,
}

/// Prize table of one two-month period (e.g. `11312`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryPeriod {
    pub period: String,
    #[serde(default)]
    pub prizes: Vec<LotteryPrize>,
}

/// An invoice number track (字軌) assigned to the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub period: String,
    pub track: String,
    pub start: String,
    pub end: String,
    pub remaining: u64,
}

/// Answer of `GET /json/time`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTime {
    /// Server unix seconds.
    #[serde(alias = "time")]
    pub timestamp: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    #[serde(default)]
    pub second: u32,
}

/// Availability of a reserved invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberStatus {
    pub available: bool,
    pub invoice_time: Option<i64>,
}

impl Default for NumberStatus {
    fn default() -> Self {
        Self {
            available: true,
            invoice_time: None,
        }
    }
}
