//! Ordered list of enrichment behaviours.

use crate::behaviour::{
    AuditBehaviour, BehaviourError, CorrelationKey, FlowedUser, LoggingApplicationName,
    MachineName, Principal, SignedInUser,
};
use crate::context::AuditContext;
use audit_types::AuditEvent;
use std::sync::Arc;

/// Behaviours run in insertion order; the first failure stops the run.
#[derive(Clone)]
pub struct AuditConfiguration {
    behaviours: Vec<Arc<dyn AuditBehaviour>>,
}

impl AuditConfiguration {
    /// Application name, correlation key and machine name, in that order.
    pub fn new() -> Self {
        Self {
            behaviours: vec![
                Arc::new(LoggingApplicationName),
                Arc::new(CorrelationKey),
                Arc::new(MachineName),
            ],
        }
    }

    /// A configuration with no behaviours at all.
    pub fn empty() -> Self {
        Self {
            behaviours: Vec::new(),
        }
    }

    pub fn add_behaviour(mut self, behaviour: impl AuditBehaviour + 'static) -> Self {
        self.behaviours.push(Arc::new(behaviour));
        self
    }

    pub fn for_flowed_user_data(self) -> Self {
        self.add_behaviour(FlowedUser)
    }

    pub fn for_signed_in_user<F>(self, provider: F) -> Self
    where
        F: Fn() -> Option<Principal> + Send + Sync + 'static,
    {
        self.add_behaviour(SignedInUser::new(provider))
    }

    pub fn len(&self) -> usize {
        self.behaviours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }

    pub fn apply_to(&self, event: &mut AuditEvent, context: &AuditContext) -> Result<(), BehaviourError> {
        for behaviour in &self.behaviours {
            behaviour.apply(event, context)?;
        }
        Ok(())
    }
}

impl Default for AuditConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
