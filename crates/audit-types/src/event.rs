//! The audit event record and its operation type.

use crate::{ArgumentError, AuditRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of operation performed on the audited target. Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum OperationType {
    #[default]
    Unspecified,
    View,
    Change,
    Action,
    Statement,
    /// Any integer code outside the known range.
    Unrecognized(i32),
}

impl OperationType {
    pub fn code(self) -> i32 {
        self.into()
    }

    /// True for the four operation types that may be persisted.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            OperationType::View
                | OperationType::Change
                | OperationType::Action
                | OperationType::Statement
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Unspecified => "Unspecified",
            OperationType::View => "View",
            OperationType::Change => "Change",
            OperationType::Action => "Action",
            OperationType::Statement => "Statement",
            OperationType::Unrecognized(_) => "Unrecognized",
        }
    }
}

impl From<i32> for OperationType {
    fn from(code: i32) -> Self {
        match code {
            0 => OperationType::Unspecified,
            1 => OperationType::View,
            2 => OperationType::Change,
            3 => OperationType::Action,
            4 => OperationType::Statement,
            other => OperationType::Unrecognized(other),
        }
    }
}

impl From<OperationType> for i32 {
    fn from(op: OperationType) -> Self {
        match op {
            OperationType::Unspecified => 0,
            OperationType::View => 1,
            OperationType::Change => 2,
            OperationType::Action => 3,
            OperationType::Statement => 4,
            OperationType::Unrecognized(code) => code,
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Unrecognized(code) => write!(f, "{}", code),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One auditable action against a target.
///
/// Built once from an [`AuditRequest`], then touched only by enrichment
/// behaviours and by validation (which normalizes blank strings to `None`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuditEvent {
    #[serde(default)]
    pub operation_type: OperationType,
    pub event_type: Option<String>,
    /// `DateTime::<Utc>::default()` marks an unset timestamp.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub description: Option<String>,
    pub data_type: Option<String>,
    pub data_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub correlation_key: Option<String>,
    pub application_name: Option<String>,
    pub machine_name: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_identity: Option<String>,
    pub session_id: Option<String>,
}

impl AuditEvent {
    /// Build an event from a request. The session id is derived from the target.
    pub fn from_request(source: &AuditRequest) -> Result<Self, ArgumentError> {
        let offset = source.timestamp().offset().local_minus_utc();
        if offset != 0 {
            return Err(ArgumentError::NonUtcTimestamp(offset));
        }

        Ok(Self {
            operation_type: source.operation_type(),
            event_type: source.event_type().map(str::to_string),
            timestamp: source.timestamp().with_timezone(&Utc),
            target_type: Some(source.target_type().to_string()),
            target_id: Some(source.target_id().to_string()),
            description: source.description().map(str::to_string),
            data_type: source.data_type().map(str::to_string),
            data_id: source.data_id().map(str::to_string),
            data: source.data().cloned(),
            session_id: Some(format!(
                "{}: {}",
                source.target_type(),
                source.target_id()
            )),
            ..Self::default()
        })
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp != DateTime::<Utc>::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn operation_type_codes_round_trip() {
        for code in [0, 1, 2, 3, 4, 99, -1] {
            assert_eq!(OperationType::from(code).code(), code);
        }
        assert_eq!(OperationType::from(2), OperationType::Change);
        assert!(!OperationType::from(i32::MAX).is_supported());
        assert!(!OperationType::Unspecified.is_supported());
    }

    #[test]
    fn operation_type_serializes_as_integer() {
        let json = serde_json::to_string(&OperationType::Statement).unwrap();
        assert_eq!(json, "4");
        let op: OperationType = serde_json::from_str("7").unwrap();
        assert_eq!(op, OperationType::Unrecognized(7));
    }

    #[test]
    fn from_request_derives_session_id() {
        let req = AuditRequest::view_of("Case", "Q1")
            .unwrap()
            .as_event("Opened")
            .unwrap();
        let event = AuditEvent::from_request(&req).unwrap();
        assert_eq!(event.session_id.as_deref(), Some("Case: Q1"));
        assert_eq!(event.operation_type, OperationType::View);
        assert_eq!(event.event_type.as_deref(), Some("Opened"));
        assert!(event.user_id.is_none());
        assert!(event.machine_name.is_none());
        assert!(event.has_timestamp());
    }

    #[test]
    fn from_request_rejects_non_utc_timestamp() {
        let local = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
            .unwrap();
        let req = AuditRequest::change_to("Case", "Q1")
            .unwrap()
            .with_timestamp(local);
        let err = AuditEvent::from_request(&req).unwrap_err();
        assert_eq!(err, ArgumentError::NonUtcTimestamp(3600));
    }

    #[test]
    fn serializes_with_pascal_case_and_nulls() {
        let req = AuditRequest::action_on("Case", "Q1").unwrap();
        let event = AuditEvent::from_request(&req).unwrap();
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["OperationType"], 3);
        assert_eq!(v["TargetType"], "Case");
        assert_eq!(v["SessionId"], "Case: Q1");
        assert!(v["Data"].is_null());
        assert!(v["DataType"].is_null());

        let back: AuditEvent = serde_json::from_value(v).unwrap();
        assert_eq!(back, event);
        assert!(back.data.is_none());
    }
}
