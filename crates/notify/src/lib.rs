//! Notification delivery for notice summaries.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - SMTP email notifier built on `lettre`
//! - Recording notifier that keeps sent messages in memory for tests

pub mod email;
pub mod recording;
pub mod traits;

pub use email::EmailNotifier;
pub use recording::RecordingNotifier;
pub use traits::{DeliveryError, Notification, Notifier};
