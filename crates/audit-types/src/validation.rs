//! Cross-field validation of audit events.
//!
//! Violations are accumulated rather than short-circuited, so a single pass
//! reports every broken rule. Field names are reported in check order.

use crate::{AuditEvent, MAX_DOCUMENT_YEAR};
use chrono::Datelike;

/// One broken rule, attributed to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

/// Validation failure carrying the ordered set of violated fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("audit event is not valid: {}", join_fields(.violations))]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

fn join_fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn add(&mut self, field: &'static str, message: &'static str) {
        if !self.0.iter().any(|v| v.field == field) {
            self.0.push(FieldViolation { field, message });
        }
    }
}

fn blank_as_none(value: &mut Option<String>) {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
    }
}

/// Both present or both absent.
fn is_valid_required_set(values: &[&Option<String>]) -> bool {
    values.iter().all(|v| v.is_some()) || values.iter().all(|v| v.is_none())
}

/// Validate `event`, first normalizing blank strings in the checked fields to `None`.
///
/// `UserEmail` and `UserIdentity` are normalized but not part of the user
/// required set; only `UserId` and `UserName` must appear together.
pub fn validate(event: &mut AuditEvent) -> Result<(), ValidationError> {
    blank_as_none(&mut event.target_type);
    blank_as_none(&mut event.target_id);
    blank_as_none(&mut event.data_type);
    blank_as_none(&mut event.data_id);
    blank_as_none(&mut event.session_id);
    blank_as_none(&mut event.user_id);
    blank_as_none(&mut event.user_name);
    blank_as_none(&mut event.user_email);
    blank_as_none(&mut event.user_identity);

    let mut violations = Violations::default();

    if !event.operation_type.is_supported() {
        violations.add("OperationType", "not a supported OperationType");
    }

    if !(0..=MAX_DOCUMENT_YEAR).contains(&event.timestamp.year()) {
        violations.add("Timestamp", "Timestamp must fall within years 0000 to 9999");
    }

    if !is_valid_required_set(&[&event.target_type, &event.target_id]) {
        const MSG: &str = "TargetType and TargetId are required together";
        violations.add("TargetType", MSG);
        violations.add("TargetId", MSG);
    }

    if !is_valid_required_set(&[&event.data_type, &event.data_id]) {
        const MSG: &str = "DataType and DataId are required together";
        violations.add("DataType", MSG);
        violations.add("DataId", MSG);
    }

    if (event.data_type.is_some() || event.data_id.is_some()) && event.data.is_none() {
        violations.add("Data", "Data is required if DataType / DataId are specified");
    }

    if event.session_id.is_none() {
        violations.add("SessionId", "a SessionId is required");
    }

    if !is_valid_required_set(&[&event.user_id, &event.user_name]) {
        const MSG: &str = "UserId and UserName are required together";
        violations.add("UserId", MSG);
        violations.add("UserName", MSG);
    }

    if violations.0.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            violations: violations.0,
        })
    }
}

impl AuditEvent {
    /// Normalize and validate in place. See [`validate`].
    pub fn ensure_valid(&mut self) -> Result<(), ValidationError> {
        validate(self)
    }
}
