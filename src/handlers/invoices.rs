use crate::error::AppError;
use crate::renderer::{invoice_number, InvoiceRenderer};
use crate::services::metrics::INVOICES_RENDERED_TOTAL;
use crate::services::InvoiceDispatcher;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Render the invoice PDF for a sale and return it inline.
#[tracing::instrument(skip(state))]
pub async fn get_invoice_pdf(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .db
        .get_sale_detail(sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Sale {} not found", sale_id)))?;

    let pdf = match InvoiceRenderer::new(&state.layout).render(&detail) {
        Ok(pdf) => {
            INVOICES_RENDERED_TOTAL.with_label_values(&["ok"]).inc();
            pdf
        }
        Err(e) => {
            INVOICES_RENDERED_TOTAL.with_label_values(&["error"]).inc();
            return Err(e);
        }
    };

    let filename = format!("invoice-{}.pdf", invoice_number(sale_id));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pdf,
    ))
}

/// Render the invoice for a sale and email it to the fixed recipient.
#[tracing::instrument(skip(state))]
pub async fn send_invoice_email(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let dispatcher = InvoiceDispatcher::new(
        state.db.clone(),
        state.mailer.clone(),
        state.layout.clone(),
        state.config.invoice.recipient_email.clone(),
    );

    let invoice_id = dispatcher.dispatch(sale_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "sent",
            "invoice_id": invoice_id,
        })),
    ))
}
