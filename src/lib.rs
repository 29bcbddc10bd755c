//! PawSpace API: schema-driven REST backend for blog posts, products, routines,
//! email leads and memberships, plus a generative-AI routine proxy.

pub mod case;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod logging;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, StoreError};
pub use generation::{GenerationConfig, GenerationError, Provider, RoutineGenerator};
pub use migration::apply_migrations;
pub use routes::{api_routes, build_app, common_routes};
pub use schema::{Record, ResourceKind, ResourceSchema};
pub use service::CrudService;
pub use settings::Settings;
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, Store};
