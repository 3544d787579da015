//! Invoice dispatch: load a sale, render its PDF, email it to the fixed
//! recipient. Fire-and-forget: any failure along the way surfaces as one
//! generic dispatch error carrying the underlying cause, and there is no
//! retry.

use crate::error::AppError;
use crate::models::SaleDetail;
use crate::renderer::{format_amount, format_sale_date, invoice_number, InvoiceLayout, InvoiceRenderer};
use crate::services::mailer::{EmailAttachment, EmailMessage, EmailTransport};
use crate::services::metrics::INVOICE_EMAILS_TOTAL;
use crate::services::Database;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct InvoiceDispatcher {
    db: Database,
    mailer: Arc<dyn EmailTransport>,
    layout: Arc<InvoiceLayout>,
    recipient: String,
}

impl InvoiceDispatcher {
    pub fn new(
        db: Database,
        mailer: Arc<dyn EmailTransport>,
        layout: Arc<InvoiceLayout>,
        recipient: String,
    ) -> Self {
        Self {
            db,
            mailer,
            layout,
            recipient,
        }
    }

    /// Render the invoice for `sale_id` and hand it to the mail transport.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, sale_id: Uuid) -> Result<String, AppError> {
        let detail = self
            .db
            .get_sale_detail(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale {} not found", sale_id)))?;

        let result = self.render_and_send(&detail).await;
        match &result {
            Ok(invoice_id) => {
                INVOICE_EMAILS_TOTAL.with_label_values(&["sent"]).inc();
                info!(invoice_id = %invoice_id, "Invoice email dispatched");
            }
            Err(_) => {
                INVOICE_EMAILS_TOTAL.with_label_values(&["failed"]).inc();
            }
        }
        result
    }

    async fn render_and_send(&self, detail: &SaleDetail) -> Result<String, AppError> {
        let pdf = InvoiceRenderer::new(&self.layout).render(detail)?;
        let email = build_invoice_email(detail, pdf, &self.recipient);
        let invoice_id = invoice_number(detail.sale.sale_id);

        self.mailer
            .send(&email)
            .await
            .map_err(|e| AppError::EmailError(format!("Failed to send invoice email: {}", e)))?;

        Ok(invoice_id)
    }
}

/// Build the outbound invoice email: fixed recipient, subject embedding the
/// invoice id, a plain-text + HTML summary body, and the PDF attached under
/// the invoice id's filename.
pub fn build_invoice_email(detail: &SaleDetail, pdf: Vec<u8>, recipient: &str) -> EmailMessage {
    let invoice_id = invoice_number(detail.sale.sale_id);
    let customer_name = detail
        .customer
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or("N/A");
    let sale_date = format_sale_date(detail.sale.sale_date);
    let total = format_amount(detail.sale.total);

    let body_text = format!(
        "A new invoice has been generated.\n\n\
         Invoice ID: {invoice_id}\n\
         Customer: {customer_name}\n\
         Date: {sale_date}\n\
         Total Amount: \u{20a6}{total}\n\
         Issued By: {issuer}\n\n\
         The invoice PDF is attached to this email.",
        issuer = detail.sale.issuer_name,
    );

    let body_html = format!(
        "<h2>Invoice Generated Successfully</h2>\
         <p>A new invoice has been generated. Please find the details below:</p>\
         <p><strong>Invoice ID:</strong> {invoice_id}<br>\
         <strong>Customer:</strong> {customer_name}<br>\
         <strong>Date:</strong> {sale_date}<br>\
         <strong>Total Amount:</strong> \u{20a6}{total}<br>\
         <strong>Issued By:</strong> {issuer}</p>\
         <p>The invoice PDF is attached to this email.</p>",
        issuer = detail.sale.issuer_name,
    );

    EmailMessage {
        to: recipient.to_string(),
        subject: format!("New Invoice Generated - {}", invoice_id),
        body_text: Some(body_text),
        body_html: Some(body_html),
        attachment: Some(EmailAttachment {
            filename: format!("{}.pdf", invoice_id),
            content_type: "application/pdf".to_string(),
            bytes: pdf,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Sale};
    use chrono::TimeZone;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sale_detail() -> SaleDetail {
        let sale_id = Uuid::parse_str("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
        let date = Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap();
        SaleDetail {
            sale: Sale {
                sale_id,
                customer_id: None,
                sale_date: date,
                total: Decimal::new(36_000_000, 2),
                issuer_name: "Demo Admin".to_string(),
                created_utc: date,
            },
            customer: Some(Customer {
                customer_id: Uuid::new_v4(),
                name: "Acme Ltd".to_string(),
                email: None,
                phone: None,
                address: None,
                created_utc: date,
            }),
            items: vec![],
        }
    }

    #[test]
    fn subject_and_filename_embed_the_invoice_id() {
        let email = build_invoice_email(&sale_detail(), b"%PDF".to_vec(), "info@example.com");

        assert_eq!(email.to, "info@example.com");
        assert_eq!(email.subject, "New Invoice Generated - INV-3FA85F64");
        assert_eq!(
            email.attachment.as_ref().unwrap().filename,
            "INV-3FA85F64.pdf"
        );
        assert_eq!(
            email.attachment.as_ref().unwrap().content_type,
            "application/pdf"
        );
    }

    #[test]
    fn body_summarizes_customer_date_total_and_issuer() {
        let email = build_invoice_email(&sale_detail(), b"%PDF".to_vec(), "info@example.com");

        let text = email.body_text.unwrap();
        assert!(text.contains("Acme Ltd"));
        assert!(text.contains("Mar 05, 2026 14:30"));
        assert!(text.contains("360,000.00"));
        assert!(text.contains("Demo Admin"));
    }

    #[test]
    fn missing_customer_falls_back_to_placeholder() {
        let mut detail = sale_detail();
        detail.customer = None;

        let email = build_invoice_email(&detail, b"%PDF".to_vec(), "info@example.com");
        assert!(email.body_text.unwrap().contains("Customer: N/A"));
    }
}
