//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// A composed message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Trait for notification channel implementations.
///
/// `send` completes once the channel has accepted the message; there is no
/// retry or queueing behind it.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;

    /// Human-readable name for this channel (e.g., "email").
    fn channel_name(&self) -> &str;
}
