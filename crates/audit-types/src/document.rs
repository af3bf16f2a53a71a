//! Storage projection of an audit event, keyed by a derived partition key.

use crate::AuditEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last year whose ids keep the fixed four-digit width.
pub const MAX_DOCUMENT_YEAR: i32 = 9999;

/// Format a timestamp as `yyyy-MM-ddTHH:mm:ss.fffffffZ` (seven fractional digits).
///
/// Lexical order of the result matches chronological order for years 0000
/// through [`MAX_DOCUMENT_YEAR`], which makes it usable both as a document id
/// and as a sort key. Validation rejects timestamps outside that range; chrono
/// renders them with a sign (`+10000`, `-0001`) and they would sort out of place.
pub fn format_document_id(timestamp: &DateTime<Utc>) -> String {
    let ticks = (timestamp.timestamp_subsec_nanos() / 100).min(9_999_999);
    format!("{}.{:07}Z", timestamp.format("%Y-%m-%dT%H:%M:%S"), ticks)
}

/// `"{target_type}-{target_id}"`. Hyphens inside either side are not escaped.
pub fn partition_key(target_type: &str, target_id: &str) -> String {
    format!("{}-{}", target_type, target_id)
}

/// Document as persisted in the partitioned store. Only `id` is lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditDocument {
    #[serde(rename = "id")]
    pub id: String,
    pub partition_key: String,
    pub operation_type: i32,
    pub event_type: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub description: Option<String>,
    pub correlation_key: Option<String>,
    pub application_name: Option<String>,
    pub machine_name: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_identity: Option<String>,
    pub data_type: Option<String>,
    pub data_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AuditDocument {
    pub fn from_event(event: &AuditEvent) -> Self {
        Self::from_event_at(event, Utc::now())
    }

    /// Map `event`, using `now` for the id when the event carries no timestamp.
    pub fn from_event_at(event: &AuditEvent, now: DateTime<Utc>) -> Self {
        let id = if event.has_timestamp() {
            format_document_id(&event.timestamp)
        } else {
            format_document_id(&now)
        };

        let has_data_type = event
            .data_type
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());

        Self {
            id,
            partition_key: partition_key(
                event.target_type.as_deref().unwrap_or_default(),
                event.target_id.as_deref().unwrap_or_default(),
            ),
            operation_type: event.operation_type.code(),
            event_type: event.event_type.clone(),
            timestamp: event.timestamp,
            target_id: event.target_id.clone(),
            target_type: event.target_type.clone(),
            description: event.description.clone(),
            correlation_key: event.correlation_key.clone(),
            application_name: event.application_name.clone(),
            machine_name: event.machine_name.clone(),
            user_id: event.user_id.clone(),
            user_name: event.user_name.clone(),
            user_email: event.user_email.clone(),
            user_identity: event.user_identity.clone(),
            data_type: event.data_type.clone(),
            data_id: event.data_id.clone(),
            data: if has_data_type { event.data.clone() } else { None },
        }
    }

    /// Fixed-width timestamp key used for ordering and continuation.
    pub fn timestamp_key(&self) -> String {
        format_document_id(&self.timestamp)
    }
}
