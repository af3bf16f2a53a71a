//! Environment configuration, read once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("AUDIT_LISTEN is not a socket address: {0}")]
    Listen(#[from] std::net::AddrParseError),
    #[error("AUDIT_STORE must be 'memory' or 'sqlite', got '{0}'")]
    Store(String),
    #[error("AUDIT_FAILURE_DELAY_MS must be a whole number of milliseconds: {0}")]
    FailureDelay(#[from] std::num::ParseIntError),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    pub store: StoreKind,
    pub sqlite_path: PathBuf,
    /// Base64 key for envelope ingest. `None` disables `/api/audit/envelope`.
    pub encryption_key: Option<String>,
    pub failure_delay: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen = get("AUDIT_LISTEN")
            .unwrap_or_else(|| "0.0.0.0:8002".to_string())
            .parse::<SocketAddr>()?;
        let store = match get("AUDIT_STORE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("") | Some("memory") => StoreKind::Memory,
            Some("sqlite") => StoreKind::Sqlite,
            Some(other) => return Err(ConfigError::Store(other.to_string())),
        };
        let sqlite_path = get("AUDIT_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("audit.db"));
        let encryption_key = get("AUDIT_ENCRYPTION_KEY").filter(|k| !k.trim().is_empty());
        let failure_delay = match get("AUDIT_FAILURE_DELAY_MS") {
            Some(ms) => Duration::from_millis(ms.trim().parse::<u64>()?),
            None => audit_service::DEFAULT_FAILURE_DELAY,
        };
        Ok(Self {
            listen,
            store,
            sqlite_path,
            encryption_key,
            failure_delay,
        })
    }
}
