//! AuditClient: request -> event -> behaviours -> validation -> (encryption) -> transport.

use crate::behaviour::BehaviourError;
use crate::configuration::AuditConfiguration;
use crate::context::AuditContext;
use crate::transport::{AuditTransport, OutboundMessage, TransportError};
use audit_crypto::{encrypt_message, EncryptionError, ORIGIN_APPLICATION, SESSION_ID};
use audit_types::{ArgumentError, AuditEvent, AuditRequest, ValidationError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("encryption: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("behaviour: {0}")]
    Behaviour(#[from] BehaviourError),
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Emits audit events through a transport.
pub struct AuditClient<T> {
    transport: T,
    configuration: AuditConfiguration,
    context: Arc<AuditContext>,
    encryption_key: Option<String>,
}

impl<T> AuditClient<T>
where
    T: AuditTransport,
{
    /// Client with the default behaviours and a fresh context.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            configuration: AuditConfiguration::new(),
            context: Arc::new(AuditContext::new()),
            encryption_key: None,
        }
    }

    pub fn with_configuration(mut self, configuration: AuditConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn with_context(mut self, context: Arc<AuditContext>) -> Self {
        self.context = context;
        self
    }

    /// Encrypt every outbound event under this base64 256-bit key.
    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn context(&self) -> &Arc<AuditContext> {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the enriched, validated event for `request` without sending it.
    pub fn prepare(&self, request: &AuditRequest) -> Result<AuditEvent, ClientError> {
        let mut event = AuditEvent::from_request(request)?;
        self.configuration.apply_to(&mut event, &self.context)?;
        event.ensure_valid()?;
        Ok(event)
    }

    fn outbound(&self, event: &AuditEvent) -> Result<OutboundMessage, ClientError> {
        let Some(key) = self.encryption_key.as_deref() else {
            return Ok(OutboundMessage::Plain(serde_json::to_string(event)?));
        };
        let mut envelope = encrypt_message(event, key)?;
        if let Some(session_id) = event.session_id.as_deref() {
            envelope = envelope.with_property(SESSION_ID, session_id);
        }
        if let Some(app) = event.application_name.as_deref() {
            envelope = envelope.with_property(ORIGIN_APPLICATION, app);
        }
        Ok(OutboundMessage::Encrypted(envelope))
    }

    pub async fn audit(&self, request: &AuditRequest) -> Result<(), ClientError> {
        let event = self.prepare(request)?;
        let message = self.outbound(&event)?;
        tracing::debug!(
            operation = %event.operation_type,
            session_id = event.session_id.as_deref().unwrap_or_default(),
            encrypted = matches!(message, OutboundMessage::Encrypted(_)),
            "sending audit event"
        );
        self.transport.send(message).await?;
        Ok(())
    }
}
