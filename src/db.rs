use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Postgres pool holding the list and member mirror tables.
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        // Fail fast on an unreachable database; the schema itself is managed elsewhere
        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::debug!("Postgres pool ready ({} max connections)", max_connections);

        Ok(Self { pool })
    }
}
