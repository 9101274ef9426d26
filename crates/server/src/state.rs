use std::sync::Arc;

use notice_core::Clock;
use notice_notify::Notifier;
use notice_storage::NoticeRepository;

use crate::service::NoticeService;

pub struct AppState {
    pub service: NoticeService,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn NoticeRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service: NoticeService::new(repository, notifier, clock),
        }
    }
}
