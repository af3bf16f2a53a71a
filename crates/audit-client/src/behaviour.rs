//! Enrichment behaviours applied to every event before validation.

use crate::context::{AuditContext, USER_EMAIL, USER_ID, USER_IDENTITY, USER_NAME};
use audit_types::AuditEvent;
use std::sync::Arc;

/// Claim type holding the user's email address; doubles as the user id.
pub const CLAIM_EMAIL: &str = "email";
pub const CLAIM_NAME: &str = "name";
pub const CLAIM_NAME_IDENTIFIER: &str = "nameidentifier";

#[derive(Debug, thiserror::Error)]
pub enum BehaviourError {
    #[error("no '{}' data item found in flowed data", USER_ID)]
    MissingFlowedUser,
    #[error("user '{user}' is authenticated, but has no '{}' claim", CLAIM_EMAIL)]
    MissingEmailClaim { user: String },
    #[error("could not read machine name: {0}")]
    MachineName(#[source] std::io::Error),
}

/// A step that fills in part of an event from ambient state.
pub trait AuditBehaviour: Send + Sync {
    fn apply(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError>;
}

impl<F> AuditBehaviour for F
where
    F: Fn(&mut AuditEvent, &AuditContext) -> Result<(), BehaviourError> + Send + Sync,
{
    fn apply(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError> {
        self(event, context)
    }
}

/// Sets `MachineName` to the host name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineName;

impl AuditBehaviour for MachineName {
    fn apply(&self, event: &mut AuditEvent, _context: &AuditContext) -> Result<(), BehaviourError> {
        let name = hostname::get().map_err(BehaviourError::MachineName)?;
        event.machine_name = Some(name.to_string_lossy().into_owned());
        Ok(())
    }
}

/// Sets `ApplicationName` from the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingApplicationName;

impl AuditBehaviour for LoggingApplicationName {
    fn apply(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError> {
        event.application_name = context.application_name();
        Ok(())
    }
}

/// Sets `CorrelationKey` from the context, or a fresh UUID when none was flowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationKey;

impl AuditBehaviour for CorrelationKey {
    fn apply(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError> {
        let key = context
            .correlation_key()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        event.correlation_key = Some(key);
        Ok(())
    }
}

/// Sets the user fields from flowed persistent data. `UserId` is mandatory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowedUser;

impl AuditBehaviour for FlowedUser {
    fn apply(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError> {
        let user_id = context
            .persistent_data(USER_ID)
            .filter(|id| !id.trim().is_empty())
            .ok_or(BehaviourError::MissingFlowedUser)?;
        event.user_id = Some(user_id);
        event.user_name = context.persistent_data(USER_NAME);
        event.user_email = context.persistent_data(USER_EMAIL);
        event.user_identity = context.persistent_data(USER_IDENTITY);
        Ok(())
    }
}

/// Identity of the signed-in caller as seen by the host application.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub name: Option<String>,
    pub authenticated: bool,
    pub claims: Vec<(String, String)>,
}

impl Principal {
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            authenticated: true,
            claims: Vec::new(),
        }
    }

    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push((claim_type.into(), value.into()));
        self
    }

    /// First value for `claim_type`.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|(t, _)| t == claim_type)
            .map(|(_, v)| v.as_str())
    }
}

type PrincipalProvider = dyn Fn() -> Option<Principal> + Send + Sync;

/// Sets the user fields from the signed-in principal.
///
/// No principal, or an unauthenticated one, leaves the event untouched.
#[derive(Clone)]
pub struct SignedInUser {
    provider: Arc<PrincipalProvider>,
}

impl SignedInUser {
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Option<Principal> + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }
}

impl AuditBehaviour for SignedInUser {
    fn apply(&self, event: &mut AuditEvent, _context: &AuditContext) -> Result<(), BehaviourError> {
        let Some(principal) = (self.provider)() else {
            return Ok(());
        };
        if !principal.authenticated {
            return Ok(());
        }
        let email = principal
            .claim(CLAIM_EMAIL)
            .ok_or_else(|| BehaviourError::MissingEmailClaim {
                user: principal.name.clone().unwrap_or_default(),
            })?;
        event.user_id = Some(email.to_string());
        event.user_name = principal.claim(CLAIM_NAME).map(str::to_string);
        event.user_email = Some(email.to_string());
        event.user_identity = principal.claim(CLAIM_NAME_IDENTIFIER).map(str::to_string);
        Ok(())
    }
}
