//! HTTP front end for the notice tracker.

pub mod api;
pub mod router;
pub mod service;
pub mod state;

pub use router::build_router;
pub use service::{NoticeService, ServiceError};
pub use state::AppState;
