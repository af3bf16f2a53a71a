//! Audit REST API server: ingest and paginated retrieval.

use audit_api::config::{ApiConfig, StoreKind};
use audit_api::server::{self, AppState};
use audit_service::DocumentAuditService;
use audit_store::{InMemoryDocumentStore, SqliteDocumentStore};
use audit_types::AuditService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    let service: Arc<dyn AuditService> = match config.store {
        StoreKind::Memory => Arc::new(
            DocumentAuditService::new(InMemoryDocumentStore::new())
                .with_failure_delay(config.failure_delay),
        ),
        StoreKind::Sqlite => {
            tracing::info!(path = %config.sqlite_path.display(), "using sqlite audit store");
            Arc::new(
                DocumentAuditService::new(SqliteDocumentStore::new(&config.sqlite_path)?)
                    .with_failure_delay(config.failure_delay),
            )
        }
    };

    if config.encryption_key.is_none() {
        tracing::info!("AUDIT_ENCRYPTION_KEY not set; envelope ingest disabled");
    }

    let state = Arc::new(AppState {
        service,
        encryption_key: config.encryption_key.clone(),
    });
    let app = server::router(state);
    tracing::info!("Audit API listening on {}", config.listen);
    axum::serve(
        tokio::net::TcpListener::bind(config.listen).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}
