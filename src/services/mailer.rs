//! Mail transport: an `EmailTransport` trait with SMTP and mock
//! implementations.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Transport not enabled: {0}")]
    NotEnabled(String),
}

/// A binary attachment carried on an outbound email.
#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An outbound email message.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub attachment: Option<EmailAttachment>,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), TransportError>;
    fn is_enabled(&self) -> bool;
}

pub struct SmtpMailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, TransportError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                TransportError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    /// Build a lettre message from an [`EmailMessage`]. Bodies become a
    /// multipart/alternative part; an attachment wraps the whole thing in
    /// multipart/mixed.
    fn build_message(&self, email: &EmailMessage) -> Result<Message, TransportError> {
        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| {
                    TransportError::Configuration(format!("Invalid from address: {}", e))
                })?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| TransportError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let body_part = match (&email.body_text, &email.body_html) {
            (Some(text), Some(html)) => MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
            (Some(text), None) => MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text.clone()),
            ),
            (None, Some(html)) => MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            (None, None) => {
                return Err(TransportError::SendFailed(
                    "Email must have either text or HTML body".to_string(),
                ));
            }
        };

        let message = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    TransportError::Configuration(format!("Invalid content type: {}", e))
                })?;
                let attachment_part = Attachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type);
                builder.multipart(
                    MultiPart::mixed()
                        .multipart(body_part)
                        .singlepart(attachment_part),
                )
            }
            None => builder.multipart(body_part),
        }
        .map_err(|e| TransportError::SendFailed(format!("Failed to build message: {}", e)))?;

        Ok(message)
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, email: &EmailMessage) -> Result<(), TransportError> {
        if !self.config.enabled {
            return Err(TransportError::NotEnabled(
                "SMTP transport is not enabled".to_string(),
            ));
        }

        let transport = self.transport.as_ref().ok_or_else(|| {
            TransportError::Configuration("SMTP transport not initialized".to_string())
        })?;

        let message = self.build_message(email)?;

        transport
            .send(message)
            .await
            .map_err(|e| TransportError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email sent successfully"
        );

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock transport for development and tests. Records every message it is
/// handed instead of sending anything.
pub struct MockMailer {
    enabled: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockMailer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

#[async_trait]
impl EmailTransport for MockMailer {
    async fn send(&self, email: &EmailMessage) -> Result<(), TransportError> {
        if !self.enabled {
            return Err(TransportError::NotEnabled(
                "Mock transport is not enabled".to_string(),
            ));
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(email.clone());

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config(enabled: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "user".to_string(),
            password: "password".to_string(),
            from_email: "invoices@example.com".to_string(),
            from_name: "Invoices".to_string(),
            enabled,
        }
    }

    #[test]
    fn build_message_with_attachment_is_multipart() {
        let mailer = SmtpMailer::new(smtp_config(false)).unwrap();
        let email = EmailMessage {
            to: "admin@example.com".to_string(),
            subject: "New Invoice Generated - INV-3FA85F64".to_string(),
            body_text: Some("See attached.".to_string()),
            body_html: Some("<p>See attached.</p>".to_string()),
            attachment: Some(EmailAttachment {
                filename: "INV-3FA85F64.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF-1.7".to_vec(),
            }),
        };

        let message = mailer.build_message(&email).unwrap();
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();
        assert!(formatted.contains("INV-3FA85F64"));
        assert!(formatted.contains("multipart/mixed"));
        assert!(formatted.contains("INV-3FA85F64.pdf"));
    }

    #[test]
    fn build_message_requires_a_body() {
        let mailer = SmtpMailer::new(smtp_config(false)).unwrap();
        let email = EmailMessage {
            to: "admin@example.com".to_string(),
            subject: "empty".to_string(),
            body_text: None,
            body_html: None,
            attachment: None,
        };

        assert!(matches!(
            mailer.build_message(&email),
            Err(TransportError::SendFailed(_))
        ));
    }

    #[tokio::test]
    async fn mock_mailer_records_messages() {
        let mailer = MockMailer::new(true);
        let email = EmailMessage {
            to: "admin@example.com".to_string(),
            subject: "hello".to_string(),
            body_text: Some("hi".to_string()),
            body_html: None,
            attachment: None,
        };

        mailer.send(&email).await.unwrap();

        assert_eq!(mailer.send_count(), 1);
        assert_eq!(mailer.sent_messages()[0].subject, "hello");
    }

    #[tokio::test]
    async fn disabled_mock_mailer_rejects() {
        let mailer = MockMailer::new(false);
        let email = EmailMessage {
            to: "admin@example.com".to_string(),
            subject: "hello".to_string(),
            body_text: Some("hi".to_string()),
            body_html: None,
            attachment: None,
        };

        assert!(matches!(
            mailer.send(&email).await,
            Err(TransportError::NotEnabled(_))
        ));
    }
}
