//! Service layer: persistence, metrics, mail transport, invoice dispatch.

pub mod database;
pub mod dispatcher;
pub mod mailer;
pub mod metrics;

pub use database::Database;
pub use dispatcher::InvoiceDispatcher;
pub use mailer::{EmailAttachment, EmailMessage, EmailTransport, MockMailer, SmtpMailer, TransportError};
pub use metrics::{get_metrics, init_metrics};
