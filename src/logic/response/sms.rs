//! SMS Alerts via the Sinch Conversation API
//!
//! One POST per alert to `/v1/projects/{project}/messages:send` with HTTP
//! Basic auth built from the access key pair.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use serde_json::{json, Value};

use super::notifier::Notifier;
use super::types::AlertMessage;
use crate::logic::error::TransportError;

const CHANNEL: &str = "sms";

#[derive(Clone)]
pub struct SmsConfig {
    pub app_id: String,
    pub access_key: String,
    pub access_secret: String,
    pub project_id: String,
    /// Phone number in E.164 form
    pub recipient: String,
    pub base_url: String,
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("app_id", &self.app_id)
            .field("access_key", &self.access_key)
            .field("access_secret", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("recipient", &self.recipient)
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub struct SinchSmsNotifier {
    config: SmsConfig,
    agent: ureq::Agent,
}

impl SinchSmsNotifier {
    pub fn new(config: SmsConfig, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { config, agent }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn authorization(&self) -> String {
        let pair = format!("{}:{}", self.config.access_key, self.config.access_secret);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(pair))
    }

    pub fn payload(&self, message: &AlertMessage) -> Value {
        json!({
            "app_id": self.config.app_id,
            "recipient": {
                "identified_by": {
                    "channel_identities": [
                        {
                            "channel": "SMS",
                            "identity": self.config.recipient
                        }
                    ]
                }
            },
            "message": {
                "text_message": {
                    "text": message.sms_text
                }
            }
        })
    }
}

impl Notifier for SinchSmsNotifier {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn notify(&self, message: &AlertMessage) -> Result<String, TransportError> {
        let response = self
            .agent
            .post(&self.endpoint())
            .set("Content-Type", "application/json")
            .set("Authorization", &self.authorization())
            .send_json(self.payload(message));

        match response {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string().map_err(|e| TransportError::Http {
                    channel: CHANNEL.to_string(),
                    message: format!("reading response body: {}", e),
                })?;
                log::info!("SMS API responded {}: {}", status, body);
                Ok(body)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                log::error!("SMS API returned {}: {}", code, body);
                Err(TransportError::Status {
                    channel: CHANNEL.to_string(),
                    code,
                    body,
                })
            }
            Err(ureq::Error::Transport(e)) => {
                log::error!("SMS request failed: {}", e);
                Err(TransportError::Http {
                    channel: CHANNEL.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
