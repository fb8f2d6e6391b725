//! Email Alerts over SMTP
//!
//! Plain-text message through an authenticated STARTTLS relay (port 587
//! by default). A fresh session is opened per alert.

use std::fmt;
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::Error as SmtpError;
use lettre::{Message, SmtpTransport, Transport};

use super::notifier::Notifier;
use super::types::AlertMessage;
use crate::logic::error::TransportError;

const CHANNEL: &str = "email";

#[derive(Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

pub struct SmtpEmailNotifier {
    config: EmailConfig,
    timeout: Duration,
}

impl SmtpEmailNotifier {
    pub fn new(config: EmailConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    pub fn build_message(&self, message: &AlertMessage) -> Result<Message, TransportError> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| TransportError::Address(format!("from '{}': {}", self.config.from, e)))?;
        let to: Mailbox = self
            .config
            .to
            .parse()
            .map_err(|e| TransportError::Address(format!("to '{}': {}", self.config.to, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| TransportError::Message(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, TransportError> {
        let builder = SmtpTransport::starttls_relay(&self.config.host).map_err(|e| TransportError::Smtp {
            message: format!("relay {}: {}", self.config.host, e),
            transient: false,
        })?;

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }
}

impl Notifier for SmtpEmailNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn notify(&self, message: &AlertMessage) -> Result<String, TransportError> {
        let email = self.build_message(message)?;
        let mailer = self.transport()?;

        match mailer.send(&email) {
            Ok(response) => {
                let text = response.message().collect::<Vec<_>>().join(" ");
                log::info!("Alert email sent to {} ({} {})", self.config.to, response.code(), text);
                Ok(format!("{} {}", response.code(), text))
            }
            Err(e) => {
                log::error!("SMTP delivery to {} failed: {}", self.config.host, e);
                Err(TransportError::Smtp {
                    message: e.to_string(),
                    transient: worth_retrying(&e),
                })
            }
        }
    }
}

/// 4xx replies plus connection, TLS and timeout faults; 5xx replies and
/// client-side errors are final
fn worth_retrying(e: &SmtpError) -> bool {
    e.is_transient() || e.is_timeout() || !(e.is_permanent() || e.is_client())
}
