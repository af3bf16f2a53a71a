//! Traits for the document store and the audit service, plus their errors.

use crate::{AuditDocument, AuditEvent, AuditPage, DocumentPage, DocumentQuery};
use async_trait::async_trait;

/// Partitioned document store (subset of a Cosmos-style collection API).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document. Returns `Conflict` when the partition already
    /// holds the id and `NotFound` when the collection is not provisioned.
    async fn create_document(&self, document: &AuditDocument) -> Result<(), StoreError>;

    /// Provision the collection if missing. Idempotent.
    async fn ensure_collection(&self) -> Result<(), StoreError>;

    /// Fetch one page, newest first, resuming after `continuation` if given.
    async fn query(
        &self,
        query: &DocumentQuery,
        page_size: usize,
        continuation: Option<&str>,
    ) -> Result<DocumentPage, StoreError>;
}

/// Persist audit events and read back paginated audit trails.
#[async_trait]
pub trait AuditService: Send + Sync {
    async fn audit(&self, event: &AuditEvent) -> Result<(), AuditServiceError>;

    async fn retrieve_page(
        &self,
        target_type: &str,
        target_id: &str,
        search_term: Option<&str>,
        page_size: usize,
        continuation: Option<&str>,
    ) -> Result<AuditPage, AuditServiceError>;
}

/// Null or empty input on a public entry point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("source must have a UTC timestamp (offset was {0}s)")]
    NonUtcTimestamp(i32),
    #[error("{name} could not be serialized: {reason}")]
    Unserializable { name: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    NotFound(String),
    #[error("document conflict: {0}")]
    Conflict(String),
    #[error("invalid continuation token: {0}")]
    InvalidContinuation(String),
    #[error("document store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuditServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
    #[error("storage: {0}")]
    Storage(#[from] StoreError),
}
