//! Recording transport for tests: keeps every message in memory, no network.

use crate::transport::{AuditTransport, OutboundMessage, TransportError};
use audit_types::AuditEvent;
use std::sync::{Mutex, PoisonError};

/// Transport that stores outbound messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    messages: Mutex<Vec<OutboundMessage>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Plain messages parsed back into events. Encrypted messages are skipped.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.messages()
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::Plain(json) => serde_json::from_str(json).ok(),
                OutboundMessage::Encrypted(_) => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AuditTransport for RecordingTransport {
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}
