//! Audit client: builds events from requests, enriches and validates them,
//! optionally encrypts them, and hands them to a transport.

mod behaviour;
mod client;
mod configuration;
mod context;
mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
mod transport;

pub use behaviour::{
    AuditBehaviour, BehaviourError, CorrelationKey, FlowedUser, LoggingApplicationName,
    MachineName, Principal, SignedInUser, CLAIM_EMAIL, CLAIM_NAME, CLAIM_NAME_IDENTIFIER,
};
pub use client::{AuditClient, ClientError};
pub use configuration::AuditConfiguration;
pub use context::{AuditContext, USER_EMAIL, USER_ID, USER_IDENTITY, USER_NAME};
pub use http::{AuditReadClient, HttpTransport};
pub use transport::{AuditTransport, OutboundMessage, TransportError};

#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingTransport;
