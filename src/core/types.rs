use serde::{Deserialize, Serialize};

/// Declares a vendor enumeration that travels as a bare integer on the wire.
macro_rules! wire_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $code:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u8", try_from = "u8")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub fn code(self) -> u8 {
                match self {
                    $( Self::$variant => $code ),+
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.code()
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $( $code => Ok(Self::$variant), )+
                    other => Err(format!("unknown {} code {other}", stringify!($name))),
                }
            }
        }
    };
}

wire_code! {
    /// Invoice-level tax type (課稅別).
    pub enum TaxType {
        /// 應稅
        Taxable = 1,
        /// 零稅率
        ZeroRated = 2,
        /// 免稅
        Exempt = 3,
        /// 應稅 (特種稅率)
        SpecialRate = 4,
        /// Items with different product tax types.
        Mixed = 9,
    }
}

wire_code! {
    /// Line-level tax type (商品課稅別).
    pub enum ProductTaxType {
        Taxable = 1,
        ZeroRated = 2,
        Exempt = 3,
    }
}

impl From<ProductTaxType> for TaxType {
    fn from(value: ProductTaxType) -> Self {
        match value {
            ProductTaxType::Taxable => TaxType::Taxable,
            ProductTaxType::ZeroRated => TaxType::ZeroRated,
            ProductTaxType::Exempt => TaxType::Exempt,
        }
    }
}

wire_code! {
    /// Thermal printer character encoding.
    pub enum PrinterEncoding {
        Big5 = 1,
        Gbk = 2,
        Utf8 = 3,
    }
}

impl PrinterEncoding {
    /// Parse the encoding names accepted by the print endpoints.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BIG5" => Some(Self::Big5),
            "GBK" => Some(Self::Gbk),
            "UTF-8" | "UTF8" => Some(Self::Utf8),
            _ => None,
        }
    }
}

wire_code! {
    /// Whether line prices include tax.
    pub enum DetailVat {
        Exclusive = 0,
        Inclusive = 1,
    }
}

wire_code! {
    /// Export clearance route for zero-rated sales.
    pub enum CustomsClearanceMark {
        NonCustoms = 1,
        Customs = 2,
    }
}

wire_code! {
    /// Which date an invoice list query filters on.
    pub enum DateSelect {
        Issued = 1,
        Uploaded = 2,
    }
}

/// Carrier type (載具類別).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarrierType {
    /// 手機條碼
    #[serde(rename = "3J0002")]
    MobileBarcode,
    /// 自然人憑證
    #[serde(rename = "CQ0001")]
    CitizenCertificate,
    /// Amego member carrier.
    #[serde(rename = "amego")]
    Member,
    #[serde(rename = "")]
    None,
}

impl CarrierType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MobileBarcode => "3J0002",
            Self::CitizenCertificate => "CQ0001",
            Self::Member => "amego",
            Self::None => "",
        }
    }
}

/// Processing status reported by the status and list endpoints.
///
/// Codes the SDK does not know are preserved in [`StatusCode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum StatusCode {
    Pending,
    Uploading,
    Uploaded,
    Processing,
    AwaitingConfirmation,
    Error,
    Complete,
    Other(u16),
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::Pending,
            2 => Self::Uploading,
            3 => Self::Uploaded,
            31 => Self::Processing,
            32 => Self::AwaitingConfirmation,
            91 => Self::Error,
            99 => Self::Complete,
            other => Self::Other(other),
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        match status {
            StatusCode::Pending => 1,
            StatusCode::Uploading => 2,
            StatusCode::Uploaded => 3,
            StatusCode::Processing => 31,
            StatusCode::AwaitingConfirmation => 32,
            StatusCode::Error => 91,
            StatusCode::Complete => 99,
            StatusCode::Other(code) => code,
        }
    }
}

impl StatusCode {
    /// Vendor description (Traditional Chinese).
    pub fn description(self) -> &'static str {
        match self {
            Self::Pending => "待處理",
            Self::Uploading => "上傳中",
            Self::Uploaded => "已上傳",
            Self::Processing => "處理中",
            Self::AwaitingConfirmation => "處理完成/待確認",
            Self::Error => "錯誤",
            Self::Complete => "完成",
            Self::Other(_) => "未知",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), u16::from(*self))
    }
}

/// MIG message type of an invoice record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceKind {
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// B2C issue.
    C0401,
    /// B2C cancellation.
    C0501,
    /// B2C void.
    C0701,
    /// B2B/B2C issue (platform).
    F0401,
    /// Cancellation (platform).
    F0501,
    #[serde(rename = "TYPE_ERROR", other)]
    TypeError,
}

/// Envelope every signed endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

/// Consumer buyer identifier used when the buyer has no tax ID.
pub const CONSUMER_BUYER_ID: &str = "0000000000";

/// Buyer name the vendor expects for consumer (B2C) invoices.
pub const CONSUMER_BUYER_NAME: &str = "消費者";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&TaxType::Mixed).unwrap(), "9");
        assert_eq!(
            serde_json::from_str::<ProductTaxType>("3").unwrap(),
            ProductTaxType::Exempt
        );
        assert!(serde_json::from_str::<TaxType>("5").is_err());
    }

    #[test]
    fn carrier_type_uses_vendor_codes() {
        assert_eq!(
            serde_json::to_string(&CarrierType::MobileBarcode).unwrap(),
            "\"3J0002\""
        );
        assert_eq!(
            serde_json::from_str::<CarrierType>("\"\"").unwrap(),
            CarrierType::None
        );
    }

    #[test]
    fn unknown_status_codes_are_preserved() {
        let status: StatusCode = serde_json::from_str("42").unwrap();
        assert_eq!(status, StatusCode::Other(42));
        assert_eq!(serde_json::to_string(&status).unwrap(), "42");
        assert_eq!(StatusCode::from(99).description(), "完成");
    }

    #[test]
    fn invoice_kind_falls_back_to_type_error() {
        assert_eq!(
            serde_json::from_str::<InvoiceKind>("\"NOT_FOUND\"").unwrap(),
            InvoiceKind::NotFound
        );
        assert_eq!(
            serde_json::from_str::<InvoiceKind>("\"X9999\"").unwrap(),
            InvoiceKind::TypeError
        );
    }

    #[test]
    fn printer_encoding_names() {
        assert_eq!(PrinterEncoding::from_name("utf-8"), Some(PrinterEncoding::Utf8));
        assert_eq!(PrinterEncoding::from_name("BIG5"), Some(PrinterEncoding::Big5));
        assert_eq!(PrinterEncoding::from_name("latin1"), None);
    }
}
