//! Prometheus metrics for the invoicing backend.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "invoicing_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Sales created counter.
pub static SALES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_sales_total",
        "Total number of sales created",
        &["outcome"] // created, rejected
    )
    .expect("Failed to register sales_total")
});

/// Invoices rendered counter.
pub static INVOICES_RENDERED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoices_rendered_total",
        "Total number of invoice PDFs rendered",
        &["outcome"] // ok, error
    )
    .expect("Failed to register invoices_rendered_total")
});

/// Invoice emails dispatched counter.
pub static INVOICE_EMAILS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "invoicing_invoice_emails_total",
        "Total number of invoice emails dispatched",
        &["outcome"] // sent, failed
    )
    .expect("Failed to register invoice_emails_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&SALES_TOTAL);
    Lazy::force(&INVOICES_RENDERED_TOTAL);
    Lazy::force(&INVOICE_EMAILS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
