//! Read-side projections returned by page retrieval.

use crate::{AuditDocument, OperationType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of an audit trail page. Omits `Data` and the target (the caller supplied it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditRecord {
    pub id: String,
    pub operation_type: OperationType,
    pub event_type: Option<String>,
    pub data_type: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

impl From<&AuditDocument> for AuditRecord {
    fn from(doc: &AuditDocument) -> Self {
        Self {
            id: doc.id.clone(),
            operation_type: OperationType::from(doc.operation_type),
            event_type: doc.event_type.clone(),
            data_type: doc.data_type.clone(),
            timestamp: doc.timestamp,
            description: doc.description.clone(),
            user_id: doc.user_id.clone(),
            user_name: doc.user_name.clone(),
            user_email: doc.user_email.clone(),
        }
    }
}

/// A page of records, newest first. `continuation_token` is `None` once exhausted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditPage {
    pub items: Vec<AuditRecord>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

impl AuditPage {
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}
