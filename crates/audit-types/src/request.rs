//! Request builder: the domain-neutral description of something to audit.

use crate::{ArgumentError, OperationType};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// A domain object that can be the target of an audit request.
pub trait AuditTarget {
    /// Identifier of this target instance (e.g. a case reference).
    fn audit_target_id(&self) -> String;

    /// Target type name. Defaults to the unqualified Rust type name.
    fn audit_target_type() -> String
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn require(name: &'static str, value: String) -> Result<String, ArgumentError> {
    if value.trim().is_empty() {
        Err(ArgumentError::Empty(name))
    } else {
        Ok(value)
    }
}

/// Immutable audit request. Builder methods consume `self` and return a new value.
#[derive(Debug, Clone)]
pub struct AuditRequest {
    operation_type: OperationType,
    event_type: Option<String>,
    timestamp: DateTime<FixedOffset>,
    target_type: String,
    target_id: String,
    description: Option<String>,
    data_type: Option<String>,
    data_id: Option<String>,
    data: Option<serde_json::Value>,
}

impl AuditRequest {
    pub fn new(
        operation_type: OperationType,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Ok(Self {
            operation_type,
            event_type: None,
            timestamp: Utc::now().fixed_offset(),
            target_type: require("target_type", target_type.into())?,
            target_id: require("target_id", target_id.into())?,
            description: None,
            data_type: None,
            data_id: None,
            data: None,
        })
    }

    pub fn view_of(
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Self::new(OperationType::View, target_type, target_id)
    }

    pub fn change_to(
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Change, target_type, target_id)
    }

    pub fn action_on(
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Action, target_type, target_id)
    }

    pub fn statement_on(
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Statement, target_type, target_id)
    }

    pub fn view_of_target<T: AuditTarget>(target: &T) -> Result<Self, ArgumentError> {
        Self::new(OperationType::View, T::audit_target_type(), target.audit_target_id())
    }

    pub fn change_to_target<T: AuditTarget>(target: &T) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Change, T::audit_target_type(), target.audit_target_id())
    }

    pub fn action_on_target<T: AuditTarget>(target: &T) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Action, T::audit_target_type(), target.audit_target_id())
    }

    pub fn statement_on_target<T: AuditTarget>(target: &T) -> Result<Self, ArgumentError> {
        Self::new(OperationType::Statement, T::audit_target_type(), target.audit_target_id())
    }

    /// Attach a payload. `DataType` becomes the fully qualified Rust type name of `T`.
    pub fn with_data<T, F>(mut self, data: &T, data_id: F) -> Result<Self, ArgumentError>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        let value = serde_json::to_value(data).map_err(|e| ArgumentError::Unserializable {
            name: "data",
            reason: e.to_string(),
        })?;
        self.data_id = Some(require("data_id", data_id(data))?);
        self.data_type = Some(std::any::type_name::<T>().to_string());
        self.data = Some(value);
        Ok(self)
    }

    pub fn with_no_data(mut self) -> Self {
        self.data_type = None;
        self.data_id = None;
        self.data = None;
        self
    }

    pub fn as_event(mut self, event_name: impl Into<String>) -> Result<Self, ArgumentError> {
        self.event_type = Some(require("event_name", event_name.into())?);
        Ok(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Result<Self, ArgumentError> {
        self.description = Some(require("description", description.into())?);
        Ok(self)
    }

    /// Override the capture time (defaults to now, in UTC).
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn data_type(&self) -> Option<&str> {
        self.data_type.as_deref()
    }

    pub fn data_id(&self) -> Option<&str> {
        self.data_id.as_deref()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}
