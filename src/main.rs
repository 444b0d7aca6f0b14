use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;

use kitobxona::core::{config, init_logger};
use kitobxona::storage::{self, migrations};
use kitobxona::telegram::{create_bot, notifications, schema, setup_bot_commands, HandlerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    // Load environment variables from .env if present
    let _ = dotenv();

    log::info!("Starting kitobxona bot");

    let db_pool = Arc::new(storage::create_pool(&config::DATABASE_PATH)?);

    // Run schema migrations. A failure is logged and startup continues so
    // that an already-migrated database keeps serving even when the
    // migration table is in an odd state.
    match storage::get_connection(&db_pool) {
        Ok(mut conn) => {
            if let Err(e) = migrations::run_migrations(&mut conn) {
                log::error!("Failed to run migrations: {}", e);
            }
            if let Err(e) = storage::stats::ensure_tables(&conn) {
                log::warn!("Failed to create stats tables: {}", e);
            }
        }
        Err(e) => log::error!("Failed to get DB connection for migrations: {}", e),
    }

    let bot = create_bot();

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }
    notifications::notify_startup(&bot).await;

    let handler = schema(HandlerDeps::new(Arc::clone(&db_pool)));

    log::info!("Starting bot in long polling mode");
    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
