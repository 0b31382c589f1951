//! Bookshelf application library
//!
//! Wires the books module, the PostgreSQL store, and the HTTP server together.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use bookshelf_kernel::{InitCtx, ModuleRegistry};

pub use modules::books;
use modules::books::store::{BookStore, PgBookStore};

/// Build a registry holding every module, bound to the given store.
pub fn build_registry(store: Arc<dyn BookStore>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store);
    registry
}

/// Connect, create the schema, and serve until shutdown.
///
/// A failing schema statement aborts startup before the listener is bound.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "bookshelf starting"
    );

    let pool = bookshelf_db::connect(&settings.database).await?;
    let registry = build_registry(Arc::new(PgBookStore::new(pool.clone())));
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;

    bookshelf_db::apply_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to prepare database schema")?;

    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    pool.close().await;

    served
}

/// Apply every module's migrations and exit.
pub async fn migrate(settings: &Settings) -> anyhow::Result<()> {
    let pool = bookshelf_db::connect(&settings.database).await?;
    let registry = build_registry(Arc::new(PgBookStore::new(pool.clone())));

    bookshelf_db::apply_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to prepare database schema")?;

    tracing::info!("migrations applied");
    pool.close().await;
    Ok(())
}
