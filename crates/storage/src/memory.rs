//! In-memory [`NoticeRepository`] for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use notice_core::{NewNotice, Notice, NoticeId, NOTICE_COLLECTION};

use crate::error::StorageError;
use crate::repository::NoticeRepository;

/// Keeps notices in a vector in insertion order.
///
/// Can be switched into an unavailable state to exercise storage failures.
#[derive(Default)]
pub struct InMemoryNoticeRepository {
    notices: Mutex<Vec<Notice>>,
    unavailable: AtomicBool,
}

impl InMemoryNoticeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("in-memory repository offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NoticeRepository for InMemoryNoticeRepository {
    async fn save(&self, notice: &NewNotice) -> Result<NoticeId, StorageError> {
        self.check_available()?;
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        let id = NoticeId::new(format!("{}/{}", NOTICE_COLLECTION, notices.len() + 1));
        notices.push(Notice::from_stored(id.clone(), notice.clone()));
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Notice>, StorageError> {
        self.check_available()?;
        Ok(self
            .notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}
