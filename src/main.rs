use yarotech_invoicing::config::AppConfig;
use yarotech_invoicing::observability::init_tracing;
use yarotech_invoicing::services::init_metrics;
use yarotech_invoicing::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing("info");
    init_metrics();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    app.run_until_stopped().await
}
