use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use amego_invoice::core::*;

fn build_invoice(lines: usize) -> CreateInvoiceRequest {
    let mut builder = InvoiceRequestBuilder::new("BENCH-001").buyer("28080623", "光貿科技有限公司");
    for i in 1..=lines {
        builder = builder.add_item(
            ProductItem::new(format!("Service item {i}"), dec!(3), dec!(120.5)).unit("hr"),
        );
    }
    builder.build().unwrap()
}

fn bench_build_invoice(c: &mut Criterion) {
    c.bench_function("build_invoice_10_lines", |b| {
        b.iter(|| black_box(build_invoice(10)));
    });
}

fn bench_calculate_amounts(c: &mut Criterion) {
    let items = build_invoice(100).items;
    let options = CalculateOptions {
        buyer_has_tax_id: true,
        ..CalculateOptions::default()
    };
    c.bench_function("calculate_amounts_100_lines", |b| {
        b.iter(|| black_box(calculate_invoice_amounts(black_box(&items), options)));
    });
}

fn bench_validate(c: &mut Criterion) {
    let request = build_invoice(100);
    c.bench_function("validate_invoice_100_lines", |b| {
        b.iter(|| black_box(validate_invoice_request(black_box(&request))));
    });
}

fn bench_serialize_and_sign(c: &mut Criterion) {
    let request = build_invoice(10);
    c.bench_function("serialize_and_sign_10_lines", |b| {
        b.iter(|| {
            let payload = serde_json::to_string(black_box(&request)).unwrap();
            black_box(SignedRequest::new(payload, 1_718_438_400, "bench-app-key"))
        });
    });
}

fn bench_sign_1000_lines(c: &mut Criterion) {
    let payload = serde_json::to_string(&build_invoice(1000)).unwrap();
    c.bench_function("sign_1000_line_payload", |b| {
        b.iter(|| black_box(sign(black_box(&payload), 1_718_438_400, "bench-app-key")));
    });
}

criterion_group!(
    benches,
    bench_build_invoice,
    bench_calculate_amounts,
    bench_validate,
    bench_serialize_and_sign,
    bench_sign_1000_lines,
);
criterion_main!(benches);
