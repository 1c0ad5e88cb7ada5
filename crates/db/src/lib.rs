//! Persistence for the Hirely marketplace.
//!
//! - [`models`]: row structs and input DTOs.
//! - [`repositories`]: zero-sized Postgres repositories taking `&PgPool`.
//! - [`store`]: the [`MarketplaceStore`] seam used by the lifecycle crate,
//!   with a Postgres ([`PgStore`]) and an in-memory ([`MemoryStore`])
//!   implementation.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod store;

pub use store::memory::MemoryStore;
pub use store::postgres::PgStore;
pub use store::{MarketplaceStore, StoreError, TransitionOutcome};

pub type DbPool = sqlx::PgPool;

/// Default maximum pool size when `DATABASE_MAX_CONNECTIONS` is not set.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the pool can reach the server.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
