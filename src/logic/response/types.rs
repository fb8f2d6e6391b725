//! Response Types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::local_hostname;
use crate::logic::error::TransportError;
use crate::logic::model::{Prediction, ATTACK_CLASS};

pub const SMS_TEXT: &str = "Ddos Attack Detected. Kindly take necessary action.";
pub const EMAIL_SUBJECT: &str = "Suspicious activity detected on your network";

const EMAIL_ADVISORY: &str = "Dear user, our model has detected malicious traffic on your network \
which could be a possible attempt of a DDoS attack. You can perform the following actions:\n\
\n\
 1. Disconnect all your devices from the network.\n\
 2. Check if any unknown software is installed on your device.\n\
 3. Contact a security professional as soon as possible.\n\
\n\
We hope this alert helps you take action at the right time.";

// ============================================================================
// ALERT RULE
// ============================================================================

/// When a single prediction counts as an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertRule {
    /// Attack score exactly 1.0
    #[default]
    ExactAttackScore,
    /// Attack class has the largest score
    Argmax,
}

impl AlertRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertRule::ExactAttackScore => "exact",
            AlertRule::Argmax => "argmax",
        }
    }

    pub fn fires(&self, prediction: &Prediction) -> bool {
        match self {
            AlertRule::ExactAttackScore => prediction.attack_score() == 1.0,
            AlertRule::Argmax => prediction.scores.len() > ATTACK_CLASS && prediction.argmax() == ATTACK_CLASS,
        }
    }
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact-attack-score" => Ok(AlertRule::ExactAttackScore),
            "argmax" => Ok(AlertRule::Argmax),
            other => Err(format!("unknown alert rule '{}' (expected exact or argmax)", other)),
        }
    }
}

// ============================================================================
// MESSAGE
// ============================================================================

/// Text sent on every channel for one detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub sms_text: String,
    pub subject: String,
    pub body: String,
    pub attack_score: f32,
}

impl AlertMessage {
    pub fn ddos(prediction: &Prediction) -> Self {
        Self::ddos_on_host(prediction, &local_hostname())
    }

    pub fn ddos_on_host(prediction: &Prediction, host: &str) -> Self {
        Self {
            sms_text: SMS_TEXT.to_string(),
            subject: EMAIL_SUBJECT.to_string(),
            body: format!("{}\n\nReported by host: {}", EMAIL_ADVISORY, host),
            attack_score: prediction.attack_score(),
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Channel accepted the message; carries the provider response
    Delivered(String),
    Failed(TransportError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }
}

#[derive(Debug)]
pub struct ChannelReport {
    pub channel: String,
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug)]
pub enum DispatchReport {
    NotTriggered { rule: AlertRule, attack_score: f32 },
    Dispatched { rule: AlertRule, channels: Vec<ChannelReport> },
}

impl DispatchReport {
    pub fn triggered(&self) -> bool {
        matches!(self, DispatchReport::Dispatched { .. })
    }

    pub fn channels(&self) -> &[ChannelReport] {
        match self {
            DispatchReport::NotTriggered { .. } => &[],
            DispatchReport::Dispatched { channels, .. } => channels,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelReport> {
        self.channels().iter().find(|c| c.channel == name)
    }

    pub fn summary(&self) -> String {
        match self {
            DispatchReport::NotTriggered { rule, attack_score } => {
                format!("not triggered (rule {}, attack score {:.4})", rule, attack_score)
            }
            DispatchReport::Dispatched { rule, channels } => {
                let parts: Vec<String> = channels
                    .iter()
                    .map(|c| match &c.outcome {
                        DeliveryOutcome::Delivered(_) => format!("{}: delivered ({} attempts)", c.channel, c.attempts),
                        DeliveryOutcome::Failed(e) => format!("{}: failed after {} attempts ({})", c.channel, c.attempts, e),
                    })
                    .collect();
                if parts.is_empty() {
                    format!("triggered (rule {}), no channels configured", rule)
                } else {
                    format!("triggered (rule {}): {}", rule, parts.join("; "))
                }
            }
        }
    }
}
