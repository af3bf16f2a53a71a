//! Core types and traits for the audit trail pipeline.
//!
//! Field names on the wire are PascalCase (plus the lowercase document `id`) so
//! that documents written by earlier producers keep deserializing.

mod document;
mod event;
mod query;
mod record;
mod request;
mod traits;
mod validation;

pub use document::*;
pub use event::*;
pub use query::*;
pub use record::*;
pub use request::*;
pub use traits::*;
pub use validation::*;
