//! Notifier seam

use super::types::AlertMessage;
use crate::logic::error::TransportError;

/// One outbound alert channel
pub trait Notifier {
    /// Channel name used in logs and reports
    fn name(&self) -> &str;

    /// Deliver the message once; returns the provider's response text
    fn notify(&self, message: &AlertMessage) -> Result<String, TransportError>;
}
