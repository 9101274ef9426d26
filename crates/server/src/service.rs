//! Notice service: create notices and send the all-notices summary.
//!
//! Stateless per call. Collaborators are injected as trait objects and
//! their errors are passed through unchanged.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use notice_core::{Clock, NewNotice, Notice, NoticeId, ValidationError};
use notice_notify::{DeliveryError, Notification, Notifier};
use notice_storage::{NoticeRepository, StorageError};

/// Subject line of the summary notification.
pub const NOTIFICATION_SUBJECT: &str = "Notices";

/// Separator between notice lines in the summary body.
pub const LINE_SEPARATOR: &str = "\r\n";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// A notice with its days-left computed for a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeSummary {
    pub notice: Notice,
    pub days_left: i64,
}

/// `"<subject> - <daysLeft> days left"`
pub fn summary_line(notice: &Notice, today: NaiveDate) -> String {
    format!("{} - {} days left", notice.subject, notice.days_left(today))
}

/// One summary line per notice, in the given order.
pub fn compose_body(notices: &[Notice], today: NaiveDate) -> String {
    notices
        .iter()
        .map(|notice| summary_line(notice, today))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

pub struct NoticeService {
    repository: Arc<dyn NoticeRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl NoticeService {
    pub fn new(
        repository: Arc<dyn NoticeRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    /// Decode a JSON `{subject, deadline}` payload and persist it.
    ///
    /// A payload that fails to decode never reaches the repository.
    pub async fn create_notice(&self, payload: &[u8]) -> Result<NoticeId, ServiceError> {
        let notice = NewNotice::from_json(payload)?;
        let id = self.repository.save(&notice).await?;
        info!(id = %id, subject = %notice.subject, deadline = %notice.deadline, "notice created");
        Ok(id)
    }

    /// Send one notification summarizing every notice.
    ///
    /// The notifier is called even when there are no notices (empty body).
    /// Returns the number of notices included.
    pub async fn send_notice_notification(&self) -> Result<usize, ServiceError> {
        let notices = self.repository.list_all().await?;
        let body = compose_body(&notices, self.clock.today());
        let notification = Notification::new(NOTIFICATION_SUBJECT, body);

        self.notifier.send(&notification).await?;
        info!(
            channel = self.notifier.channel_name(),
            notices = notices.len(),
            "notice notification sent"
        );
        Ok(notices.len())
    }

    /// Every notice with its days-left relative to today.
    pub async fn list_notices(&self) -> Result<Vec<NoticeSummary>, ServiceError> {
        let today = self.clock.today();
        Ok(self
            .repository
            .list_all()
            .await?
            .into_iter()
            .map(|notice| NoticeSummary {
                days_left: notice.days_left(today),
                notice,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use notice_core::FixedClock;
    use notice_notify::RecordingNotifier;
    use notice_storage::InMemoryNoticeRepository;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    struct Harness {
        repository: Arc<InMemoryNoticeRepository>,
        notifier: Arc<RecordingNotifier>,
        service: NoticeService,
    }

    fn harness() -> Harness {
        let repository = Arc::new(InMemoryNoticeRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = NoticeService::new(
            repository.clone(),
            notifier.clone(),
            Arc::new(FixedClock(today())),
        );
        Harness {
            repository,
            notifier,
            service,
        }
    }

    fn payload(subject: &str, days_from_today: i64) -> Vec<u8> {
        let deadline = (today() + Duration::days(days_from_today)).and_hms_opt(17, 45, 0).unwrap();
        serde_json::to_vec(&serde_json::json!({
            "subject": subject,
            "deadline": deadline.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_list_keeps_subject_and_deadline() {
        let h = harness();
        let id = h.service.create_notice(&payload("Tax return", 5)).await.unwrap();
        assert_eq!(id.as_str(), "notices/1");

        let listed = h.service.list_notices().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].notice.subject, "Tax return");
        assert_eq!(
            listed[0].notice.deadline,
            (today() + Duration::days(5)).and_hms_opt(17, 45, 0).unwrap()
        );
        assert_eq!(listed[0].days_left, 5);
    }

    #[tokio::test]
    async fn single_notice_notification() {
        let h = harness();
        h.service.create_notice(&payload("Test Notice", 2)).await.unwrap();

        assert_eq!(h.service.send_notice_notification().await.unwrap(), 1);
        assert_eq!(
            h.notifier.sent(),
            vec![Notification::new("Notices", "Test Notice - 2 days left")]
        );
    }

    #[tokio::test]
    async fn two_notices_produce_two_lines_in_repository_order() {
        let h = harness();
        h.service.create_notice(&payload("Rent", 0)).await.unwrap();
        h.service.create_notice(&payload("Passport", -3)).await.unwrap();

        h.service.send_notice_notification().await.unwrap();
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "Rent - 0 days left\r\nPassport - -3 days left");
    }

    #[tokio::test]
    async fn empty_store_still_sends_empty_body() {
        let h = harness();
        assert_eq!(h.service.send_notice_notification().await.unwrap(), 0);
        assert_eq!(h.notifier.sent(), vec![Notification::new("Notices", "")]);
    }

    #[tokio::test]
    async fn missing_subject_is_validation_error_and_not_persisted() {
        let h = harness();
        let err = h
            .service
            .create_notice(br#"{"deadline":"2026-10-21"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "got: {err}");
        assert!(h.repository.is_empty());
    }

    #[tokio::test]
    async fn storage_failure_skips_notifier() {
        let h = harness();
        h.repository.set_unavailable(true);

        let err = h.service.send_notice_notification().await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)), "got: {err}");
        assert!(h.notifier.sent().is_empty());

        let err = h.service.create_notice(&payload("x", 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
    }

    #[tokio::test]
    async fn delivery_failure_leaves_notices_in_place() {
        let h = harness();
        h.service.create_notice(&payload("Rent", 1)).await.unwrap();
        h.notifier.set_failing(true);

        let err = h.service.send_notice_notification().await.unwrap_err();
        assert!(matches!(err, ServiceError::Delivery(_)), "got: {err}");
        assert_eq!(h.repository.len(), 1);
    }

    #[test]
    fn summary_line_ignores_time_of_day() {
        let notice = Notice::from_stored(
            NoticeId::new("notices/1"),
            NewNotice::new("Late", (today() + Duration::days(1)).and_time(NaiveTime::MIN)),
        );
        assert_eq!(summary_line(&notice, today()), "Late - 1 days left");
    }
}
