//! Document store implementations: in-memory and (feature `sqlite`) SQLite.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use audit_types::{
    ContinuationToken, DocumentPage, DocumentQuery, DocumentStore, StoreError,
};
pub use memory::InMemoryDocumentStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDocumentStore;

/// Split a page-size-plus-one fetch into a page and its continuation token.
pub(crate) fn into_page(
    mut documents: Vec<audit_types::AuditDocument>,
    page_size: usize,
) -> DocumentPage {
    let continuation_token = if documents.len() > page_size {
        documents.truncate(page_size);
        documents
            .last()
            .map(|last| ContinuationToken::after(last).encode())
    } else {
        None
    };
    DocumentPage {
        documents,
        continuation_token,
    }
}
