//! Ambient audit context shared by everything that emits audit events.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Persistent-data key for the flowed user id.
pub const USER_ID: &str = "UserId";
pub const USER_NAME: &str = "UserName";
pub const USER_EMAIL: &str = "UserEmail";
pub const USER_IDENTITY: &str = "UserIdentity";

/// Application name, correlation key and flowed key/value data.
///
/// Share it as `Arc<AuditContext>`; every setter is last-write-wins.
#[derive(Debug, Default)]
pub struct AuditContext {
    application_name: RwLock<Option<String>>,
    correlation_key: RwLock<Option<String>>,
    persistent_data: RwLock<HashMap<String, String>>,
}

impl AuditContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_application(name: impl Into<String>) -> Self {
        let context = Self::default();
        context.set_application_name(name);
        context
    }

    pub fn application_name(&self) -> Option<String> {
        self.application_name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_application_name(&self, name: impl Into<String>) {
        *self
            .application_name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(name.into());
    }

    pub fn correlation_key(&self) -> Option<String> {
        self.correlation_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_correlation_key(&self, key: impl Into<String>) {
        *self
            .correlation_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(key.into());
    }

    /// The named persistent data item, or `None` if nothing was stored under `key`.
    pub fn persistent_data(&self, key: &str) -> Option<String> {
        self.persistent_data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn add_or_update_persistent_data(&self, key: impl Into<String>, value: impl Into<String>) {
        self.persistent_data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }
}
