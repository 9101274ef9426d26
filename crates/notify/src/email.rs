//! SMTP email notifier via `lettre` with TLS support.
//!
//! Delivers notifications as plain-text emails through an SMTP relay.
//! Supports STARTTLS, implicit TLS (port 465) and unencrypted connections.

use crate::traits::{DeliveryError, Notification, Notifier};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, DeliveryError> {
    addr.parse()
        .map_err(|e: lettre::address::AddressError| DeliveryError::Config(format!("{addr}: {e}")))
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from SMTP configuration.
    ///
    /// - `smtp_port`: defaults to 587. Port 465 always uses implicit TLS.
    /// - `tls`: `None` or `Some(true)` enables STARTTLS on other ports.
    /// - `from` / `to`: plain addresses or `"Name <addr@example.com>"`.
    ///
    /// - `credentials`: `(username, password)` for SMTP AUTH; `None` connects
    ///   unauthenticated.
    pub fn from_config(
        smtp_host: &str,
        smtp_port: Option<u16>,
        tls: Option<bool>,
        credentials: Option<(String, String)>,
        from: &str,
        to: &[String],
    ) -> Result<Self, DeliveryError> {
        let from_mailbox = parse_mailbox(from)?;
        let to_mailboxes = to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        if to_mailboxes.is_empty() {
            return Err(DeliveryError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let port = smtp_port.unwrap_or(587);
        let use_tls = tls.unwrap_or(true);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
                .map_err(|e| DeliveryError::Config(e.to_string()))?
                .port(port)
        } else if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_host)
                .map_err(|e| DeliveryError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host).port(port)
        };

        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: from_mailbox,
            to: to_mailboxes,
        })
    }

    /// Build the MIME message for a notification.
    fn compose(&self, notification: &Notification) -> Result<Message, DeliveryError> {
        let mut message_builder = Message::builder()
            .from(self.from.clone())
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.to {
            message_builder = message_builder.to(recipient.clone());
        }

        message_builder
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| DeliveryError::Smtp(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send a notification email to all configured recipients.
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let email = self.compose(notification)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipients = self.to.len(),
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
