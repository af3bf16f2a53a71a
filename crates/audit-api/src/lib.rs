//! Audit REST API: ingest (plain and encrypted) and paginated retrieval.

pub mod config;
pub mod server;
