//! Notice persistence.
//!
//! This crate provides:
//! - `DocumentStore`, an embedded JSON document store with unit-of-work sessions
//! - `NoticeRepository` trait for pluggable notice persistence
//! - Document-store-backed and in-memory repository implementations

pub mod document_store;
pub mod error;
pub mod memory;
pub mod repository;

pub use document_store::{DocumentStore, Session};
pub use error::StorageError;
pub use memory::InMemoryNoticeRepository;
pub use repository::{DocumentNoticeRepository, NoticeRepository};
