//! End-to-end invoice pipeline without live Postgres or SMTP: build a sale
//! detail in memory, render it, assemble the email, and hand it to the mock
//! transport.

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use yarotech_invoicing::models::{Customer, Sale, SaleDetail, SaleItem};
use yarotech_invoicing::renderer::{format_amount, InvoiceLayout, InvoiceRenderer};
use yarotech_invoicing::services::dispatcher::build_invoice_email;
use yarotech_invoicing::services::{EmailTransport, MockMailer, TransportError};

fn sale_detail() -> SaleDetail {
    let sale_id = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
    let customer_id = Uuid::parse_str("8c3f1d20-0d6a-4b5e-9a11-92f0c1d24e01").unwrap();
    let date = Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap();

    let items = vec![
        SaleItem {
            sale_item_id: Uuid::from_u128(1),
            sale_id,
            product_id: None,
            product_name: "Dell Latitude 5420".to_string(),
            quantity: 1,
            price: "350000.00".parse().unwrap(),
            sort_order: 0,
            created_utc: date,
        },
        SaleItem {
            sale_item_id: Uuid::from_u128(2),
            sale_id,
            product_id: None,
            product_name: "USB-C Dock".to_string(),
            quantity: 2,
            price: "5000.00".parse().unwrap(),
            sort_order: 1,
            created_utc: date,
        },
    ];

    let total = items.iter().fold(Decimal::ZERO, |acc, i| acc + i.total());

    SaleDetail {
        sale: Sale {
            sale_id,
            customer_id: Some(customer_id),
            sale_date: date,
            total,
            issuer_name: "Demo Admin".to_string(),
            created_utc: date,
        },
        customer: Some(Customer {
            customer_id,
            name: "Acme Ltd".to_string(),
            email: None,
            phone: None,
            address: None,
            created_utc: date,
        }),
        items,
    }
}

#[test]
fn item_totals_sum_exactly() {
    let detail = sale_detail();
    assert_eq!(detail.sale.total, "360000.00".parse::<Decimal>().unwrap());
    assert_eq!(format_amount(detail.sale.total), "360,000.00");
}

#[tokio::test]
async fn rendered_invoice_flows_through_the_mock_transport() {
    let detail = sale_detail();
    let layout = InvoiceLayout::default();
    let pdf = InvoiceRenderer::new(&layout).render(&detail).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let email = build_invoice_email(&detail, pdf, "info@yarotech.com.ng");
    let mailer = MockMailer::new(true);
    mailer.send(&email).await.unwrap();

    let sent = mailer.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "info@yarotech.com.ng");
    assert_eq!(sent[0].subject, "New Invoice Generated - INV-3FA85F64");

    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.filename, "INV-3FA85F64.pdf");
    assert_eq!(attachment.content_type, "application/pdf");
    assert!(attachment.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn disabled_transport_surfaces_a_single_error() {
    let detail = sale_detail();
    let layout = InvoiceLayout::default();
    let pdf = InvoiceRenderer::new(&layout).render(&detail).unwrap();

    let email = build_invoice_email(&detail, pdf, "info@yarotech.com.ng");
    let mailer = MockMailer::new(false);

    assert!(matches!(
        mailer.send(&email).await,
        Err(TransportError::NotEnabled(_))
    ));
    assert_eq!(mailer.send_count(), 0);
}
