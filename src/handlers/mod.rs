//! HTTP handlers for resource CRUD and routine generation.

pub mod generation;
pub mod resource;
pub use generation::*;
pub use resource::*;
