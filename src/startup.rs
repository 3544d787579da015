//! Application startup and lifecycle management.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers::{customers, health, invoices, products, sales};
use crate::renderer::InvoiceLayout;
use crate::services::{Database, EmailTransport, MockMailer, SmtpMailer};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub mailer: Arc<dyn EmailTransport>,
    pub layout: Arc<InvoiceLayout>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: AppConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        db.run_migrations().await?;

        let mailer: Arc<dyn EmailTransport> = if config.smtp.enabled {
            match SmtpMailer::new(config.smtp.clone()) {
                Ok(mailer) => {
                    tracing::info!("SMTP mail transport initialized");
                    Arc::new(mailer)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize SMTP transport: {}. Using mock.", e);
                    Arc::new(MockMailer::new(true))
                }
            }
        } else {
            tracing::info!("SMTP transport disabled, using mock mail transport");
            Arc::new(MockMailer::new(true))
        };

        let state = AppState {
            config: config.clone(),
            db,
            mailer,
            layout: Arc::new(InvoiceLayout::default()),
        };

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Invoicing backend listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Build the full route surface.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:customer_id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:product_id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route(
            "/sales/:sale_id",
            get(sales::get_sale).delete(sales::delete_sale),
        )
        .route("/sales/:sale_id/invoice", get(invoices::get_invoice_pdf))
        .route("/sales/:sale_id/email", post(invoices::send_invoice_email))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
