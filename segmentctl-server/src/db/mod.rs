//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - Connection pool, passed explicitly - no global handle
//! - List operations aggregate with JOINs - no N+1 queries
//! - Rely on DB constraints, absorb conflicts - no check-then-insert for memberships
//! - One transaction per membership change

pub mod pool;
pub mod repos;
pub mod store;

pub use pool::{create_pool, create_pool_with_options, run_migrations, MIGRATOR};
pub use repos::{MembershipRepo, SegmentRepo, UserRepo};
pub use store::PgStore;
