//! Storage layer
//!
//! Low-level pieces of the offline database:
//!
//! - `schema`: tables, indexes, and the schema version
//! - `counters`: persisted per-kind id counters
//! - `error`: typed storage errors
//!
//! `crate::store::LocalStore` combines them.

pub mod counters;
pub mod error;
pub mod schema;

pub use counters::{EntityKind, IdCounters};
pub use error::{StoreError, StoreResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
