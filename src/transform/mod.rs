//! Payload adaptation passes used by [`crate::transformer::RequestAdapter`].

pub mod content;
pub mod schema;

pub use content::{flatten_content, FlattenContentTransformer};
pub use schema::{sanitize_schema, SchemaSanitizeTransformer};
