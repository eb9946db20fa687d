use anyhow::Context;
use sqlx::MySqlPool;

use crate::config::{Config, StoreBackend};
use crate::store::Store;

pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Builds the store selected by configuration.
pub async fn init_store(config: &Config) -> anyhow::Result<Store> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Store::memory())
        }
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the mysql store")?;
            Ok(Store::mysql(init_db(url).await?))
        }
    }
}
