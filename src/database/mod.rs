//! Database layer
//!
//! Connection pooling, repositories and the service facade.

pub mod connection;
pub mod repositories;
pub mod service;

pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use service::DatabaseService;
