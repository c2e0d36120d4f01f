//! segmentctl-server: users, segments and membership reconciliation over HTTP
//!
//! - [`store`]: store traits plus the in-memory implementation
//! - [`db`]: PostgreSQL pool, migrations and repositories
//! - [`http`]: axum router, handlers and error mapping

pub mod db;
pub mod http;
pub mod store;

pub use db::PgStore;
pub use http::{build_router, run_server, AppState, ServerConfig};
pub use store::{MemoryStore, Store, StoreError};
