pub mod clock;
pub mod config;
pub mod error;
pub mod notice;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::ValidationError;
pub use notice::{NewNotice, Notice, NoticeId, NOTICE_COLLECTION};
