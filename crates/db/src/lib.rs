//! PostgreSQL connection handling and schema bootstrap.

use anyhow::Context;
use bookshelf_kernel::settings::DatabaseSettings;
use bookshelf_kernel::Migration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a PostgreSQL connection pool from the configured settings.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let url = settings.require_url()?;

    tracing::info!(
        target: "bookshelf-db",
        max_connections = settings.max_connections,
        "connecting to database"
    );

    create_pool(url, settings.max_connections)
        .await
        .with_context(|| "failed to connect to database")
}

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Execute every migration's `up` statement in order.
///
/// There is no ledger table: statements run on each start and must be idempotent.
pub async fn apply_migrations(
    pool: &PgPool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        tracing::info!(
            target: "bookshelf-db",
            module = %module,
            migration = migration.id,
            "applying migration"
        );

        sqlx::raw_sql(migration.up)
            .execute(pool)
            .await
            .with_context(|| {
                format!(
                    "migration '{}' of module '{}' failed",
                    migration.id, module
                )
            })?;
    }

    Ok(())
}
