//! [`NoticeRepository`] trait and its document-store implementation.

use async_trait::async_trait;
use tracing::debug;

use notice_core::{NewNotice, Notice, NoticeId, NOTICE_COLLECTION};

use crate::document_store::DocumentStore;
use crate::error::StorageError;

/// Persistence boundary for notices.
///
/// Every call is its own unit of work; nothing is cached between calls.
#[async_trait]
pub trait NoticeRepository: Send + Sync {
    /// Persist a new notice and return its assigned identity.
    async fn save(&self, notice: &NewNotice) -> Result<NoticeId, StorageError>;

    /// Every persisted notice, in store order. Empty when none exist.
    async fn list_all(&self) -> Result<Vec<Notice>, StorageError>;
}

/// Stores notices as documents in the `notices` collection.
#[derive(Clone)]
pub struct DocumentNoticeRepository {
    store: DocumentStore,
}

impl DocumentNoticeRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NoticeRepository for DocumentNoticeRepository {
    async fn save(&self, notice: &NewNotice) -> Result<NoticeId, StorageError> {
        let mut session = self.store.open_session();
        let id = session.store(NOTICE_COLLECTION, notice)?;
        session.save_changes().await?;
        debug!(id = %id, subject = %notice.subject, "notice saved");
        Ok(NoticeId::new(id))
    }

    async fn list_all(&self) -> Result<Vec<Notice>, StorageError> {
        let session = self.store.open_session();
        let notices: Vec<Notice> = session
            .query::<NewNotice>(NOTICE_COLLECTION)
            .await?
            .into_iter()
            .map(|(id, stored)| Notice::from_stored(NoticeId::new(id), stored))
            .collect();
        debug!(count = notices.len(), "notices listed");
        Ok(notices)
    }
}
