#![cfg(feature = "core")]

use amego_invoice::core::tax::prepare_invoice_amounts;
use amego_invoice::core::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn allowance_item(amount: rust_decimal::Decimal) -> AllowanceItem {
    AllowanceItem {
        original_invoice_number: "AB12345678".into(),
        original_invoice_date: "20240601".into(),
        original_description: "Coffee".into(),
        quantity: dec!(1),
        unit: None,
        unit_price: amount,
        amount,
        tax_type: ProductTaxType::Taxable,
    }
}

// --- B2B / B2C invoices ---

#[test]
fn b2b_inclusive_invoice_splits_tax() {
    let request = InvoiceRequestBuilder::new("ORDER-001")
        .buyer("28080623", "光貿科技有限公司")
        .add_item(ProductItem::new("Consulting", dec!(1), dec!(168)))
        .build()
        .unwrap();

    assert_eq!(request.tax_type, TaxType::Taxable);
    assert_eq!(request.tax_rate, dec!(0.05));
    assert_eq!(request.sales_amount, dec!(160));
    assert_eq!(request.tax_amount, dec!(8));
    assert_eq!(request.total_amount, dec!(168));
    assert_eq!(request.detail_vat, Some(DetailVat::Inclusive));
}

#[test]
fn b2b_exclusive_invoice_adds_tax() {
    let request = InvoiceRequestBuilder::new("ORDER-002")
        .buyer("28080623", "光貿科技有限公司")
        .add_item(ProductItem::new("Consulting", dec!(2), dec!(80)))
        .price_exclusive(true)
        .build()
        .unwrap();

    assert_eq!(request.sales_amount, dec!(160));
    assert_eq!(request.tax_amount, dec!(8));
    assert_eq!(request.total_amount, dec!(168));
    assert_eq!(request.detail_vat, Some(DetailVat::Exclusive));
}

#[test]
fn b2c_invoice_with_mobile_carrier() {
    let request = InvoiceRequestBuilder::new("ORDER-003")
        .mobile_barcode("/ABC+123")
        .add_item(ProductItem::new("Tea", dec!(3), dec!(35)).unit("cup"))
        .build()
        .unwrap();

    assert_eq!(request.buyer_identifier, CONSUMER_BUYER_ID);
    assert_eq!(request.tax_amount, dec!(0));
    assert_eq!(request.sales_amount, dec!(105));
    assert_eq!(request.carrier_type, Some(CarrierType::MobileBarcode));
    assert_eq!(request.carrier_id1.as_deref(), Some("/ABC+123"));
    assert_eq!(request.carrier_id2.as_deref(), Some("/ABC+123"));
}

#[test]
fn mixed_tax_types_produce_mixed_invoice() {
    let request = InvoiceRequestBuilder::new("ORDER-004")
        .buyer("28080623", "光貿科技有限公司")
        .add_item(ProductItem::new("Taxed", dec!(1), dec!(105)))
        .add_item(ProductItem::new("Exempt", dec!(1), dec!(50)).tax_type(ProductTaxType::Exempt))
        .build()
        .unwrap();

    assert_eq!(request.tax_type, TaxType::Mixed);
    assert_eq!(request.sales_amount, dec!(100));
    assert_eq!(request.tax_amount, dec!(5));
    assert_eq!(request.free_tax_sales_amount, dec!(50));
    assert_eq!(request.total_amount, dec!(155));
}

#[test]
fn builder_reports_every_violation() {
    let err = InvoiceRequestBuilder::new("")
        .buyer("123", "")
        .donate("12")
        .build()
        .unwrap_err();

    let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
    for expected in ["OrderId", "BuyerIdentifier", "BuyerName", "NPOBAN", "ProductItem"] {
        assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
    }
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn item_violations_are_nested_by_index() {
    let mut bad = ProductItem::new("Coffee", dec!(2), dec!(55));
    bad.amount = dec!(100);

    let err = InvoiceRequestBuilder::new("ORDER-005")
        .add_item(ProductItem::new("Ok", dec!(1), dec!(10)))
        .add_item(bad)
        .build()
        .unwrap_err();

    assert!(
        err.violations()
            .iter()
            .any(|v| v.field.starts_with("ProductItem[1]"))
    );
}

#[test]
fn out_of_range_tax_rate_is_a_validation_error() {
    for rate in [dec!(-1), dec!(-0.05), dec!(1), dec!(1.5)] {
        let err = InvoiceRequestBuilder::new("ORDER-007")
            .buyer("28080623", "光貿科技有限公司")
            .add_item(ProductItem::new("Consulting", dec!(1), dec!(100)))
            .tax_rate(rate)
            .build()
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation, "rate {rate}");
        assert!(err.violations().iter().any(|v| v.field == "TaxRate"));
    }

    let zero_rate = InvoiceRequestBuilder::new("ORDER-008")
        .buyer("28080623", "光貿科技有限公司")
        .add_item(ProductItem::new("Consulting", dec!(1), dec!(100)))
        .tax_rate(dec!(0))
        .build()
        .unwrap();
    assert_eq!(zero_rate.tax_amount, dec!(0));
}

#[test]
fn request_validation_checks_tax_rate() {
    let mut request = InvoiceRequestBuilder::new("ORDER-009")
        .add_item(ProductItem::new("Tea", dec!(1), dec!(35)))
        .build()
        .unwrap();
    request.tax_rate = dec!(-1);

    let errors = validate_invoice_request(&request);
    assert!(errors.iter().any(|e| e.field == "TaxRate"));
    assert!(validate_tax_rate(DEFAULT_TAX_RATE).is_ok());
}

#[test]
fn allowance_rejects_out_of_range_tax_rate() {
    let err = AllowanceRequestBuilder::new("AL-004", date(2024, 6, 20))
        .buyer("28080623", "光貿科技有限公司")
        .add_item(allowance_item(dec!(100)))
        .tax_rate(dec!(2))
        .build()
        .unwrap_err();
    assert!(err.violations().iter().any(|v| v.field == "TaxRate"));
}

// --- Wire format ---

#[test]
fn invoice_serializes_with_vendor_field_names() {
    let request = InvoiceRequestBuilder::new("ORDER-006")
        .donate("919")
        .add_item(ProductItem::new("Coffee", dec!(1), dec!(55)))
        .build()
        .unwrap();
    let value = serde_json::to_value(&request).unwrap();

    assert_eq!(value["OrderId"], "ORDER-006");
    assert_eq!(value["NPOBAN"], "919");
    assert_eq!(value["TaxType"], 1);
    assert_eq!(value["DetailVat"], 1);
    assert_eq!(value["ProductItem"][0]["Description"], "Coffee");
    assert_eq!(value["ProductItem"][0]["TaxType"], 1);
    assert!(value.get("CarrierType").is_none());
    assert!(value.get("BuyerAddress").is_none());
}

#[test]
fn status_response_tolerates_unknown_codes() {
    let status: InvoiceStatus = serde_json::from_value(json!({
        "invoice_number": "AB12345678",
        "type": "SOMETHING_NEW",
        "status": 42,
        "total_amount": 100
    }))
    .unwrap();

    assert_eq!(status.kind, InvoiceKind::TypeError);
    assert_eq!(status.status, StatusCode::Other(42));
}

// --- Allowances ---

#[test]
fn allowance_builder_computes_tax_and_total() {
    let request = AllowanceRequestBuilder::new("AL-001", date(2024, 6, 20))
        .buyer("28080623", "光貿科技有限公司")
        .add_item(allowance_item(dec!(100)))
        .add_item(allowance_item(dec!(50)))
        .build()
        .unwrap();

    assert_eq!(request.total_amount, dec!(150));
    assert_eq!(request.tax_amount, dec!(8));

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["AllowanceDate"], "2024-06-20");
    assert_eq!(value["ProductItem"][0]["Tax"], 1);
}

#[test]
fn allowance_amount_override() {
    let request = AllowanceRequestBuilder::new("AL-002", date(2024, 6, 20))
        .buyer("28080623", "光貿科技有限公司")
        .add_item(allowance_item(dec!(100)))
        .amounts(dec!(4), dec!(100))
        .build()
        .unwrap();

    assert_eq!(request.tax_amount, dec!(4));
}

#[test]
fn allowance_without_items_is_rejected() {
    let err = AllowanceRequestBuilder::new("AL-003", date(2024, 6, 20))
        .buyer("28080623", "光貿科技有限公司")
        .build()
        .unwrap_err();
    assert!(err.violations().iter().any(|v| v.field == "ProductItem"));
}

// --- Tax helpers ---

#[test]
fn prepared_amounts_infer_buyer_kind() {
    let items = [ProductItem::new("Consulting", dec!(1), dec!(168))];

    let b2b = prepare_invoice_amounts(&items, "28080623", DEFAULT_TAX_RATE);
    assert_eq!(b2b.amounts.tax_amount, dec!(8));
    assert_eq!(b2b.tax_rate, DEFAULT_TAX_RATE);

    let b2c = prepare_invoice_amounts(&items, CONSUMER_BUYER_ID, DEFAULT_TAX_RATE);
    assert_eq!(b2c.amounts.tax_amount, dec!(0));
    assert_eq!(b2c.amounts.total_amount, dec!(168));
}

// --- Local validators ---

#[test]
fn carrier_and_donation_formats() {
    assert!(validate_mobile_barcode("/AB.-+12").is_ok());
    assert!(validate_mobile_barcode("/abc1234").is_err());
    assert!(validate_mobile_barcode("ABC12345").is_err());

    assert!(validate_citizen_certificate("AB12345678901234").is_ok());
    assert!(validate_citizen_certificate("ab12345678901234").is_err());
    assert!(validate_citizen_certificate("AB1234567890123").is_err());

    assert!(validate_donation_code("919").is_ok());
    assert!(validate_donation_code("1234567").is_ok());
    assert!(validate_donation_code("12").is_err());
    assert!(validate_donation_code("12345678").is_err());
}

#[test]
fn tax_id_kinds() {
    assert_eq!(validate_tax_id(CONSUMER_BUYER_ID), Ok(BuyerKind::Consumer));
    assert_eq!(validate_tax_id("28080623"), Ok(BuyerKind::Business));
    assert!(validate_tax_id("2808062A").is_err());
}

// --- Signing ---

#[test]
fn signed_request_form_fields() {
    let signed = SignedRequest::new(r#"{"InvoiceNumber":"AB12345678"}"#.into(), 1_700_000_000, "key");
    let fields = signed.form_fields("12345678");

    assert_eq!(fields[0], ("invoice", "12345678".to_string()));
    assert_eq!(fields[1].0, "data");
    assert_eq!(fields[2], ("time", "1700000000".to_string()));
    assert_eq!(
        fields[3],
        (
            "sign",
            sign(r#"{"InvoiceNumber":"AB12345678"}"#, 1_700_000_000, "key")
        )
    );
}
