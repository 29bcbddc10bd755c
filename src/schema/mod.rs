//! Resource schema registry: one declarative definition per resource drives validation, filtering, storage and DDL.

mod registry;
mod types;

pub use registry::*;
pub use types::*;

/// A stored or normalized record: camelCase keys to JSON values, `id` included once persisted.
pub type Record = serde_json::Map<String, serde_json::Value>;
