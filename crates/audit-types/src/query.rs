//! Partition-scoped query contract and keyset continuation tokens.

use crate::{AuditDocument, StoreError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Filter for one page of a partition's audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub partition_key: String,
    /// Case-insensitive substring matched against `UserName` or `EventType`.
    pub search_term: Option<String>,
}

impl DocumentQuery {
    pub fn for_partition(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            search_term: None,
        }
    }

    /// An empty term matches every string, so it is treated as no filter at all.
    pub fn with_search_term(mut self, term: Option<&str>) -> Self {
        self.search_term = term.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }

    pub fn matches(&self, doc: &AuditDocument) -> bool {
        if doc.partition_key != self.partition_key {
            return false;
        }
        let Some(term) = self.search_term.as_deref() else {
            return true;
        };
        let needle = term.to_lowercase();
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        contains(&doc.user_name) || contains(&doc.event_type)
    }

    /// Render as the document-store SQL dialect, for diagnostics.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from(
            "SELECT c.id AS Id, c.EventType, c.Timestamp, c.DataType, c.Description, \
             c.UserId, c.UserName, c.UserEmail, c.OperationType FROM c \
             WHERE c.PartitionKey = @partitionKey",
        );
        if self.search_term.is_some() {
            sql.push_str(
                " AND (CONTAINS(LOWER(c.UserName), @searchTerm) \
                 OR CONTAINS(LOWER(c.EventType), @searchTerm))",
            );
        }
        sql.push_str(" ORDER BY c.Timestamp DESC");
        sql
    }
}

/// Newest first: timestamp key descending, then id descending.
pub fn newest_first(a: &AuditDocument, b: &AuditDocument) -> Ordering {
    b.timestamp_key()
        .cmp(&a.timestamp_key())
        .then_with(|| b.id.cmp(&a.id))
}

/// One page of raw documents as returned by a store.
#[derive(Debug, Clone, Default)]
pub struct DocumentPage {
    pub documents: Vec<AuditDocument>,
    pub continuation_token: Option<String>,
}

/// Position of the last returned document. Encoded as base64url JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    #[serde(rename = "ts")]
    pub timestamp_key: String,
    pub id: String,
}

impl ContinuationToken {
    pub fn after(doc: &AuditDocument) -> Self {
        Self {
            timestamp_key: doc.timestamp_key(),
            id: doc.id.clone(),
        }
    }

    pub fn encode(&self) -> String {
        let json = serde_json::json!({ "ts": self.timestamp_key, "id": self.id });
        URL_SAFE_NO_PAD.encode(json.to_string())
    }

    pub fn decode(token: &str) -> Result<Self, StoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| StoreError::InvalidContinuation(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidContinuation(e.to_string()))
    }

    /// Parse an optional token; an empty string means "start from the beginning".
    pub fn parse(token: Option<&str>) -> Result<Option<Self>, StoreError> {
        match token {
            Some(t) if !t.trim().is_empty() => Self::decode(t).map(Some),
            _ => Ok(None),
        }
    }

    /// True when `doc` sorts strictly after this position (i.e. is older).
    pub fn is_before(&self, doc: &AuditDocument) -> bool {
        let key = doc.timestamp_key();
        match key.as_str().cmp(self.timestamp_key.as_str()) {
            Ordering::Less => true,
            Ordering::Equal => doc.id.as_str() < self.id.as_str(),
            Ordering::Greater => false,
        }
    }
}
