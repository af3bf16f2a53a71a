//! In-memory document store: partition key -> id -> document.

use crate::into_page;
use audit_types::{
    newest_first, AuditDocument, ContinuationToken, DocumentPage, DocumentQuery, DocumentStore,
    StoreError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Partitions = HashMap<String, HashMap<String, AuditDocument>>;

/// In-memory DocumentStore. `None` means the collection has not been provisioned yet.
pub struct InMemoryDocumentStore {
    collection: Arc<RwLock<Option<Partitions>>>,
}

impl InMemoryDocumentStore {
    /// A store whose collection already exists.
    pub fn new() -> Self {
        Self {
            collection: Arc::new(RwLock::new(Some(HashMap::new()))),
        }
    }

    /// A store that reports `NotFound` until `ensure_collection` runs.
    pub fn unprovisioned() -> Self {
        Self {
            collection: Arc::new(RwLock::new(None)),
        }
    }

    /// Total number of stored documents across partitions.
    pub async fn len(&self) -> usize {
        self.collection
            .read()
            .await
            .as_ref()
            .map(|parts| parts.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_provisioned() -> StoreError {
    StoreError::NotFound("audit collection has not been provisioned".to_string())
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, document: &AuditDocument) -> Result<(), StoreError> {
        let mut guard = self.collection.write().await;
        let parts = guard.as_mut().ok_or_else(not_provisioned)?;
        let partition = parts.entry(document.partition_key.clone()).or_default();
        if partition.contains_key(&document.id) {
            return Err(StoreError::Conflict(format!(
                "document {} already exists in partition {}",
                document.id, document.partition_key
            )));
        }
        partition.insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn ensure_collection(&self) -> Result<(), StoreError> {
        let mut guard = self.collection.write().await;
        if guard.is_none() {
            tracing::info!("provisioning in-memory audit collection");
            *guard = Some(HashMap::new());
        }
        Ok(())
    }

    async fn query(
        &self,
        query: &DocumentQuery,
        page_size: usize,
        continuation: Option<&str>,
    ) -> Result<DocumentPage, StoreError> {
        if page_size == 0 {
            return Err(StoreError::Other("page size must be greater than zero".to_string()));
        }
        let after = ContinuationToken::parse(continuation)?;

        let guard = self.collection.read().await;
        let parts = guard.as_ref().ok_or_else(not_provisioned)?;
        let mut documents: Vec<AuditDocument> = parts
            .get(&query.partition_key)
            .map(|p| {
                p.values()
                    .filter(|d| query.matches(d))
                    .filter(|d| after.as_ref().map_or(true, |t| t.is_before(d)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(guard);

        documents.sort_by(newest_first);
        documents.truncate(page_size.saturating_add(1));
        Ok(into_page(documents, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_types::{AuditEvent, OperationType};
    use chrono::{TimeZone, Utc};

    fn document(target_id: &str, user: &str, minute: u32) -> AuditDocument {
        let event = AuditEvent {
            operation_type: OperationType::View,
            event_type: Some("Viewed".to_string()),
            timestamp: Utc.with_ymd_and_hms(2023, 4, 1, 10, minute, 0).unwrap(),
            target_type: Some("Case".to_string()),
            target_id: Some(target_id.to_string()),
            user_id: Some(user.to_lowercase()),
            user_name: Some(user.to_string()),
            session_id: Some(format!("Case: {}", target_id)),
            ..AuditEvent::default()
        };
        AuditDocument::from_event(&event)
    }

    async fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for minute in 1..=5 {
            let user = if minute % 2 == 0 { "Alice" } else { "Bob" };
            store
                .create_document(&document("Q1", user, minute))
                .await
                .unwrap();
        }
        store
            .create_document(&document("Q2", "Bob", 9))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn pages_newest_first_with_continuation() {
        let store = seeded().await;
        let q = DocumentQuery::for_partition("Case-Q1");

        let first = store.query(&q, 2, None).await.unwrap();
        let minutes: Vec<String> = first.documents.iter().map(|d| d.id.clone()).collect();
        assert_eq!(
            minutes,
            vec!["2023-04-01T10:05:00.0000000Z", "2023-04-01T10:04:00.0000000Z"]
        );
        let token = first.continuation_token.expect("more results");

        let second = store.query(&q, 2, Some(&token)).await.unwrap();
        assert_eq!(second.documents.len(), 2);
        assert_eq!(second.documents[0].id, "2023-04-01T10:03:00.0000000Z");
        assert_eq!(second.documents[1].id, "2023-04-01T10:02:00.0000000Z");

        let third = store
            .query(&q, 2, second.continuation_token.as_deref())
            .await
            .unwrap();
        assert_eq!(third.documents.len(), 1);
        assert!(third.continuation_token.is_none());
    }

    #[tokio::test]
    async fn exact_fit_has_no_continuation() {
        let store = seeded().await;
        let page = store
            .query(&DocumentQuery::for_partition("Case-Q1"), 5, None)
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 5);
        assert!(page.continuation_token.is_none());
    }

    #[tokio::test]
    async fn search_filters_within_partition() {
        let store = seeded().await;
        let q = DocumentQuery::for_partition("Case-Q1").with_search_term(Some("alice"));
        let page = store.query(&q, 10, None).await.unwrap();
        assert_eq!(page.documents.len(), 2);
        assert!(page
            .documents
            .iter()
            .all(|d| d.user_name.as_deref() == Some("Alice")));
    }

    #[tokio::test]
    async fn duplicate_id_in_partition_conflicts() {
        let store = InMemoryDocumentStore::new();
        let doc = document("Q1", "Bob", 1);
        store.create_document(&doc).await.unwrap();
        let err = store.create_document(&doc).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len().await, 1);

        // Same id in a different partition is fine.
        store
            .create_document(&document("Q2", "Bob", 1))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn unprovisioned_reports_not_found_until_ensured() {
        let store = InMemoryDocumentStore::unprovisioned();
        let doc = document("Q1", "Bob", 1);
        assert!(matches!(
            store.create_document(&doc).await,
            Err(StoreError::NotFound(_))
        ));
        store.ensure_collection().await.unwrap();
        store.ensure_collection().await.unwrap();
        store.create_document(&doc).await.unwrap();
        assert!(!store.is_empty().await);
    }

    #[tokio::test]
    async fn largest_page_size_returns_everything() {
        let store = seeded().await;
        let page = store
            .query(&DocumentQuery::for_partition("Case-Q1"), usize::MAX, None)
            .await
            .unwrap();
        assert_eq!(page.documents.len(), 5);
        assert!(page.continuation_token.is_none());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let store = InMemoryDocumentStore::new();
        store
            .create_document(&document("Q1", "ÉMILE", 1))
            .await
            .unwrap();
        let q = DocumentQuery::for_partition("Case-Q1").with_search_term(Some("émile"));
        assert_eq!(store.query(&q, 10, None).await.unwrap().documents.len(), 1);
    }

    #[tokio::test]
    async fn invalid_token_is_rejected() {
        let store = seeded().await;
        let err = store
            .query(&DocumentQuery::for_partition("Case-Q1"), 2, Some("%%%"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidContinuation(_)));
    }
}
