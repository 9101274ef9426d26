//! In-memory notifier that records what it was asked to send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::traits::{DeliveryError, Notification, Notifier};

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    should_fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every `send` fails with [`DeliveryError::Rejected`].
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    /// Notifications accepted so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected("recording notifier set to fail".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}
