//! Alert Dispatcher
//!
//! Single decision point for detections. When the configured rule fires,
//! every notifier is tried on its own with bounded retries; one channel
//! failing never stops the next.

use std::thread;
use std::time::Duration;

use super::email::SmtpEmailNotifier;
use super::notifier::Notifier;
use super::sms::SinchSmsNotifier;
use super::types::{AlertMessage, AlertRule, ChannelReport, DeliveryOutcome, DispatchReport};
use crate::constants::{DEFAULT_ALERT_MAX_ATTEMPTS, DEFAULT_ALERT_RETRY_BACKOFF_MS, DEFAULT_ALERT_TIMEOUT_SECS};
use crate::logic::config::AppConfig;
use crate::logic::model::Prediction;

#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub rule: AlertRule,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    /// Per-request timeout for every outbound call
    pub timeout: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            rule: AlertRule::default(),
            max_attempts: DEFAULT_ALERT_MAX_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_ALERT_RETRY_BACKOFF_MS),
            timeout: Duration::from_secs(DEFAULT_ALERT_TIMEOUT_SECS),
        }
    }
}

pub struct AlertDispatcher {
    rule: AlertRule,
    max_attempts: u32,
    backoff: Duration,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl AlertDispatcher {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            rule: config.rule,
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff,
            notifiers: Vec::new(),
        }
    }

    /// Dispatcher with every channel that is fully configured
    pub fn from_config(config: &AppConfig) -> Self {
        let mut dispatcher = Self::new(&config.alert);

        match &config.sms {
            Some(sms) => {
                dispatcher = dispatcher.with_notifier(Box::new(SinchSmsNotifier::new(sms.clone(), config.alert.timeout)))
            }
            None => log::warn!("SMS alerts disabled: messaging API credentials not configured"),
        }
        match &config.email {
            Some(email) => {
                dispatcher = dispatcher.with_notifier(Box::new(SmtpEmailNotifier::new(email.clone(), config.alert.timeout)))
            }
            None => log::warn!("Email alerts disabled: SMTP settings not configured"),
        }

        dispatcher
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    pub fn rule(&self) -> AlertRule {
        self.rule
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Evaluate one prediction and alert if the rule fires
    pub fn dispatch(&self, prediction: &Prediction) -> DispatchReport {
        log::info!(
            "Alert decision: rule={}, scores={:?}",
            self.rule,
            prediction.scores
        );

        if !self.rule.fires(prediction) {
            log::info!("No alert: prediction does not meet rule '{}'", self.rule);
            return DispatchReport::NotTriggered {
                rule: self.rule,
                attack_score: prediction.attack_score(),
            };
        }

        log::warn!("DDoS detected (attack score {:.4}), alerting {} channel(s)", prediction.attack_score(), self.notifiers.len());
        let message = AlertMessage::ddos(prediction);
        self.send(&message)
    }

    /// Deliver a prepared message on every channel
    pub fn send(&self, message: &AlertMessage) -> DispatchReport {
        let channels = self.notifiers.iter().map(|n| self.deliver(n.as_ref(), message)).collect();
        DispatchReport::Dispatched {
            rule: self.rule,
            channels,
        }
    }

    fn deliver(&self, notifier: &dyn Notifier, message: &AlertMessage) -> ChannelReport {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match notifier.notify(message) {
                Ok(response) => {
                    log::info!("{} alert delivered on attempt {}", notifier.name(), attempts);
                    return ChannelReport {
                        channel: notifier.name().to_string(),
                        attempts,
                        outcome: DeliveryOutcome::Delivered(response),
                    };
                }
                Err(e) if e.is_retryable() && attempts < self.max_attempts => {
                    log::warn!(
                        "{} alert attempt {}/{} failed: {}; retrying in {:?}",
                        notifier.name(),
                        attempts,
                        self.max_attempts,
                        e,
                        self.backoff
                    );
                    thread::sleep(self.backoff);
                }
                Err(e) => {
                    log::error!("{} alert failed after {} attempt(s): {}", notifier.name(), attempts, e);
                    return ChannelReport {
                        channel: notifier.name().to_string(),
                        attempts,
                        outcome: DeliveryOutcome::Failed(e),
                    };
                }
            }
        }
    }
}
