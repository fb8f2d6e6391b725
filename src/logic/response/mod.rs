//! Response Module - Detection Alerts
//!
//! Turns a positive prediction into outbound alerts. Channels implement
//! [`Notifier`]; the [`AlertDispatcher`] owns the firing rule and retries.

pub mod types;
pub mod notifier;
pub mod sms;
pub mod email;
pub mod dispatcher;


// Re-exports
pub use dispatcher::{AlertConfig, AlertDispatcher};
pub use email::{EmailConfig, SmtpEmailNotifier};
pub use notifier::Notifier;
pub use sms::{SinchSmsNotifier, SmsConfig};
pub use types::{AlertMessage, AlertRule, ChannelReport, DeliveryOutcome, DispatchReport, EMAIL_SUBJECT, SMS_TEXT};
