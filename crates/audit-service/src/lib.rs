//! Audit service: persists events through a document store and reads back pages.

mod document;
pub use audit_types::{AuditService, AuditServiceError};
pub use document::{DocumentAuditService, DEFAULT_FAILURE_DELAY};
