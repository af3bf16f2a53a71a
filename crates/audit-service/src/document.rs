//! DocumentAuditService: AuditService over any DocumentStore.

use audit_types::{
    partition_key, ArgumentError, AuditDocument, AuditEvent, AuditPage, AuditRecord,
    AuditService, AuditServiceError, DocumentQuery, DocumentStore, StoreError,
};
use std::time::Duration;

/// Back-off applied before a non-recoverable storage failure is returned.
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(3);

/// Audit service that persists events into a partitioned document store.
pub struct DocumentAuditService<S> {
    pub store: S,
    /// Sleep before surfacing a storage failure other than NotFound/Conflict.
    pub failure_delay: Duration,
}

impl<S> DocumentAuditService<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            failure_delay: DEFAULT_FAILURE_DELAY,
        }
    }

    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    async fn create(&self, document: &AuditDocument) -> Result<(), StoreError> {
        match self.store.create_document(document).await {
            Err(StoreError::NotFound(reason)) => {
                tracing::info!(reason = %reason, "audit collection missing; provisioning and retrying");
                self.store.ensure_collection().await?;
                self.store.create_document(document).await
            }
            other => other,
        }
    }

    async fn fail(&self, e: StoreError) -> AuditServiceError {
        tracing::warn!(
            error = %e,
            delay_ms = self.failure_delay.as_millis() as u64,
            "failed to store audit document"
        );
        tokio::time::sleep(self.failure_delay).await;
        AuditServiceError::Storage(e)
    }
}

#[async_trait::async_trait]
impl<S> AuditService for DocumentAuditService<S>
where
    S: DocumentStore,
{
    async fn audit(&self, event: &AuditEvent) -> Result<(), AuditServiceError> {
        let document = AuditDocument::from_event(event);
        match self.create(&document).await {
            Ok(()) => Ok(()),
            // The same event was already stored.
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!(id = %document.id, reason = %reason, "audit document already exists");
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn retrieve_page(
        &self,
        target_type: &str,
        target_id: &str,
        search_term: Option<&str>,
        page_size: usize,
        continuation: Option<&str>,
    ) -> Result<AuditPage, AuditServiceError> {
        if target_type.trim().is_empty() {
            return Err(ArgumentError::Empty("target_type").into());
        }
        if target_id.trim().is_empty() {
            return Err(ArgumentError::Empty("target_id").into());
        }
        if page_size == 0 {
            return Err(ArgumentError::NotPositive("page_size").into());
        }

        let query = DocumentQuery::for_partition(partition_key(target_type, target_id))
            .with_search_term(search_term);
        tracing::debug!(sql = %query.to_sql(), partition = %query.partition_key, "querying audit trail");

        let page = match self.store.query(&query, page_size, continuation).await {
            Ok(page) => page,
            // Nothing has ever been written, so there is nothing to read.
            Err(StoreError::NotFound(_)) => return Ok(AuditPage::default()),
            Err(e) => return Err(e.into()),
        };

        Ok(AuditPage {
            items: page.documents.iter().map(AuditRecord::from).collect(),
            continuation_token: page.continuation_token,
        })
    }
}
