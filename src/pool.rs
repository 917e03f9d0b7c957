//! Database connection pool management.
//!
//! The pool is driver-agnostic (`sqlx::AnyPool`): the URL scheme picks the
//! driver, so `postgres://…` runs against PostgreSQL and `sqlite:…` against
//! SQLite. It is created once at startup, handed to the
//! [`Gateway`](crate::Gateway), and closed after the server stops.

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a connection pool for `database_url`.
///
/// # Errors
///
/// Returns an error if the URL scheme has no driver or the first connection
/// cannot be established.
pub async fn create_pool(database_url: &str) -> Result<AnyPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a connection pool with a custom connection limit.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_in_memory_sqlite() {
        let pool = create_pool_with_options("sqlite::memory:", 1).await.unwrap();

        let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);

        pool.close().await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn rejects_unknown_scheme() {
        assert!(create_pool("nosuchdb://localhost/users").await.is_err());
    }
}
