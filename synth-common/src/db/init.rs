//! Database connection helpers
//!
//! Every legacy round and the analysis target are SQLite databases addressed
//! by URL. Sources are only ever read; the target is created on first open.

use crate::Result;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

/// Open a read-only connection to a legacy synth database
pub async fn connect_source(url: &str) -> Result<SqliteConnection> {
    debug!("Connecting to source database: {}", url);

    let conn = SqliteConnectOptions::from_str(url)?
        .read_only(true)
        .connect()
        .await?;

    Ok(conn)
}

/// Open a read-write connection to the analysis database
///
/// The database file is created if it does not exist yet and foreign keys
/// are enforced for the lifetime of the connection.
pub async fn connect_target(url: &str) -> Result<SqliteConnection> {
    let newly_created = !database_exists(url).await?;

    let conn = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .connect()
        .await?;

    if newly_created {
        info!("Initialized new analysis database: {}", url);
    } else {
        debug!("Opened existing analysis database: {}", url);
    }

    Ok(conn)
}

/// Check whether the physical database behind a URL exists
pub async fn database_exists(url: &str) -> Result<bool> {
    Ok(Sqlite::database_exists(url).await?)
}
