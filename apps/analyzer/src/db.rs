use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the append-only feedback table if it does not exist yet.
pub async fn ensure_feedback_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id           BIGSERIAL PRIMARY KEY,
            submitted_at TIMESTAMPTZ NOT NULL,
            text         TEXT NOT NULL,
            origin       TEXT NOT NULL,
            rating       SMALLINT
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("feedback table ready");
    Ok(())
}
