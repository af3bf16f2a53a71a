//! Outbound transport seam.

use audit_crypto::Envelope;

/// What actually leaves the process: the plain event JSON, or its encrypted envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Plain(String),
    Encrypted(Envelope),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid service url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("audit service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Delivers outbound audit messages to the backend.
#[async_trait::async_trait]
pub trait AuditTransport: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError>;
}
