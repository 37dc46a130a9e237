use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::{auth::repo::STORE_TIMEOUT, config::AppConfig};

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let mut options =
        PgConnectOptions::from_str(&config.database_url).context("parse DATABASE_URL")?;
    if let Some(name) = &config.database_name {
        options = options.database(name);
    }

    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(STORE_TIMEOUT)
        .idle_timeout(Duration::from_secs(300))
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}
