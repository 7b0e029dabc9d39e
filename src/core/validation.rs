use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::allowance::CreateAllowanceRequest;
use super::error::ValidationError;
use super::invoice::{CreateInvoiceRequest, ProductItem};
use super::types::*;

/// Largest tolerated gap between `quantity × unit_price` and `amount`.
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.0000001);

pub const MAX_PRODUCT_ITEMS: usize = 9999;

/// Outcome of a successful tax ID check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyerKind {
    /// 8-digit business tax ID (B2B).
    Business,
    /// The consumer placeholder `0000000000` (B2C).
    Consumer,
}

/// Check a buyer tax ID (統一編號).
pub fn validate_tax_id(tax_id: &str) -> Result<BuyerKind, ValidationError> {
    if tax_id == CONSUMER_BUYER_ID {
        return Ok(BuyerKind::Consumer);
    }
    if tax_id.chars().count() != 8 {
        return Err(ValidationError::new("tax_id", "Tax ID must be 8 digits"));
    }
    if !tax_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new(
            "tax_id",
            "Tax ID must contain only digits",
        ));
    }
    Ok(BuyerKind::Business)
}

/// Check a mobile barcode carrier: `/` followed by 7 of `0-9 A-Z + - .`.
pub fn validate_mobile_barcode(barcode: &str) -> Result<(), ValidationError> {
    if !barcode.starts_with('/') {
        return Err(ValidationError::new(
            "barcode",
            "Mobile barcode must start with /",
        ));
    }
    if barcode.chars().count() != 8 {
        return Err(ValidationError::new(
            "barcode",
            "Mobile barcode must be 8 characters",
        ));
    }
    let valid = barcode[1..]
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return Err(ValidationError::new(
            "barcode",
            "Mobile barcode contains invalid characters",
        ));
    }
    Ok(())
}

/// Check a natural person certificate carrier: 2 uppercase letters + 14 digits.
pub fn validate_citizen_certificate(cert_id: &str) -> Result<(), ValidationError> {
    if !cert_id.is_ascii() || cert_id.len() != 16 {
        return Err(ValidationError::new(
            "certificate",
            "Certificate must be 16 characters",
        ));
    }
    let (prefix, digits) = cert_id.split_at(2);
    if !prefix.bytes().all(|b| b.is_ascii_uppercase()) || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ValidationError::new(
            "certificate",
            "Invalid certificate format",
        ));
    }
    Ok(())
}

/// Check a donation code (捐贈碼): 3 to 7 digits.
pub fn validate_donation_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new(
            "donation_code",
            "Donation code must contain only digits",
        ));
    }
    if !(3..=7).contains(&code.len()) {
        return Err(ValidationError::new(
            "donation_code",
            "Donation code must be 3-7 digits",
        ));
    }
    Ok(())
}

/// Check a tax rate given as a fraction: at least 0 and below 1.
pub fn validate_tax_rate(rate: Decimal) -> Result<(), ValidationError> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(ValidationError::new(
            "TaxRate",
            format!("TaxRate {rate} must be at least 0 and below 1"),
        ));
    }
    Ok(())
}

/// Validate one product line.
/// Returns all validation errors found (not just the first).
pub fn validate_product_item(item: &ProductItem) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let description_len = item.description.chars().count();
    if description_len == 0 {
        errors.push(ValidationError::new(
            "Description",
            "description must not be empty",
        ));
    } else if description_len > 256 {
        errors.push(ValidationError::new(
            "Description",
            "description must not exceed 256 characters",
        ));
    }

    if let Some(unit) = &item.unit {
        if unit.chars().count() > 6 {
            errors.push(ValidationError::new(
                "Unit",
                "unit must not exceed 6 characters",
            ));
        }
    }

    if let Some(remark) = &item.remark {
        if remark.chars().count() > 40 {
            errors.push(ValidationError::new(
                "Remark",
                "remark must not exceed 40 characters",
            ));
        }
    }

    let expected = item.quantity * item.unit_price;
    if (expected - item.amount).abs() > AMOUNT_TOLERANCE {
        errors.push(ValidationError::new(
            "Amount",
            format!(
                "amount {} does not match Quantity * UnitPrice ({expected})",
                item.amount
            ),
        ));
    }

    errors
}

/// Validate a full invoice request before it is sent.
/// Returns all validation errors found (not just the first).
pub fn validate_invoice_request(request: &CreateInvoiceRequest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let order_len = request.order_id.chars().count();
    if order_len == 0 {
        errors.push(ValidationError::new("OrderId", "OrderId is required"));
    } else if order_len > 40 {
        errors.push(ValidationError::new(
            "OrderId",
            "OrderId must not exceed 40 characters",
        ));
    }

    let buyer_len = request.buyer_identifier.chars().count();
    if !(8..=10).contains(&buyer_len) {
        errors.push(ValidationError::new(
            "BuyerIdentifier",
            "BuyerIdentifier must be 8 to 10 characters",
        ));
    }

    if request.buyer_name.trim().is_empty() {
        errors.push(ValidationError::new("BuyerName", "BuyerName is required"));
    }

    if let Some(email) = request.buyer_email_address.as_deref() {
        if !email.is_empty() && !looks_like_email(email) {
            errors.push(ValidationError::new(
                "BuyerEmailAddress",
                "invalid email address",
            ));
        }
    }

    if let Some(remark) = &request.main_remark {
        if remark.chars().count() > 200 {
            errors.push(ValidationError::new(
                "MainRemark",
                "MainRemark must not exceed 200 characters",
            ));
        }
    }

    if let Err(err) = validate_tax_rate(request.tax_rate) {
        errors.push(err);
    }

    validate_carrier(request, &mut errors);

    if let Some(code) = request.npoban.as_deref() {
        if let Err(err) = validate_donation_code(code) {
            errors.push(ValidationError::new("NPOBAN", err.message));
        }
    }

    if let Some(reason) = request.zero_tax_rate_reason {
        if !(71..=79).contains(&reason) {
            errors.push(ValidationError::new(
                "ZeroTaxRateReason",
                "ZeroTaxRateReason must be between 71 and 79",
            ));
        }
    }

    for (field, flag) in [
        ("DetailAmountRound", request.detail_amount_round),
        ("PrintDetail", request.print_detail),
    ] {
        if flag.is_some_and(|v| v > 1) {
            errors.push(ValidationError::new(field, "must be 0 or 1"));
        }
    }

    if request.items.is_empty() {
        errors.push(ValidationError::new(
            "ProductItem",
            "At least one ProductItem is required",
        ));
    } else if request.items.len() > MAX_PRODUCT_ITEMS {
        errors.push(ValidationError::new(
            "ProductItem",
            format!("ProductItem cannot exceed {MAX_PRODUCT_ITEMS} items"),
        ));
    }

    for (i, item) in request.items.iter().enumerate() {
        let parent = format!("ProductItem[{i}]");
        errors.extend(
            validate_product_item(item)
                .into_iter()
                .map(|err| err.nested(&parent)),
        );
    }

    errors
}

/// Validate an allowance request before it is sent.
pub fn validate_allowance_request(request: &CreateAllowanceRequest) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if request.allowance_number.trim().is_empty() {
        errors.push(ValidationError::new(
            "AllowanceNumber",
            "AllowanceNumber is required",
        ));
    }
    if let Err(err) = validate_tax_id(&request.buyer_identifier) {
        errors.push(ValidationError::new("BuyerIdentifier", err.message));
    }
    if request.buyer_name.trim().is_empty() {
        errors.push(ValidationError::new("BuyerName", "BuyerName is required"));
    }
    if request.items.is_empty() {
        errors.push(ValidationError::new(
            "ProductItem",
            "At least one ProductItem is required",
        ));
    }

    for (i, item) in request.items.iter().enumerate() {
        let parent = format!("ProductItem[{i}]");
        if item.original_invoice_number.trim().is_empty() {
            errors.push(
                ValidationError::new("OriginalInvoiceNumber", "must not be empty").nested(&parent),
            );
        }
        if (item.quantity * item.unit_price - item.amount).abs() > AMOUNT_TOLERANCE {
            errors.push(
                ValidationError::new("Amount", "amount does not match Quantity * UnitPrice")
                    .nested(&parent),
            );
        }
    }

    errors
}

fn validate_carrier(request: &CreateInvoiceRequest, errors: &mut Vec<ValidationError>) {
    let Some(carrier_type) = request.carrier_type else {
        return;
    };
    let Some(carrier_id) = request.carrier_id1.as_deref() else {
        if carrier_type != CarrierType::None {
            errors.push(ValidationError::new(
                "CarrierId1",
                "CarrierId1 is required when CarrierType is set",
            ));
        }
        return;
    };

    let check = match carrier_type {
        CarrierType::MobileBarcode => validate_mobile_barcode(carrier_id),
        CarrierType::CitizenCertificate => validate_citizen_certificate(carrier_id),
        CarrierType::Member | CarrierType::None => Ok(()),
    };
    if let Err(err) = check {
        errors.push(ValidationError::new("CarrierId1", err.message));
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
