use std::future::Future;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::config::db::{db_url, DbKind, DbOwner, DbProfile};
use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;

fn engine(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Postgres => "postgresql",
        DbKind::SqliteFile | DbKind::SqliteMemory => "sqlite",
    }
}

/// Retry a connection attempt at a fixed interval, returning the last error.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(conn) => {
                if attempt > 1 {
                    info!(attempts = attempt, "connection_retry=success");
                }
                return Ok(conn);
            }
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                warn!(attempt, max_attempts, error = %e, "connection_retry=failed");
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                attempt += 1;
            }
        }
    }
}

fn connect_options(kind: DbKind, url: String) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    opts.sqlx_logging(false);
    match kind {
        // Every pooled connection to `sqlite::memory:` is a separate database,
        // so the pool is pinned to a single long-lived connection.
        DbKind::SqliteMemory => {
            opts.max_connections(1)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(24 * 3600))
                .max_lifetime(Duration::from_secs(24 * 3600));
        }
        DbKind::SqliteFile => {
            opts.max_connections(1);
        }
        DbKind::Postgres => {
            opts.max_connections(20)
                .min_connections(1)
                .connect_timeout(Duration::from_secs(5))
                .acquire_timeout(Duration::from_secs(5));
        }
    }
    opts
}

/// Connect without running migrations.
pub async fn connect_db(
    kind: DbKind,
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let url = db_url(kind, profile, owner)?;

    let conn = retry_connection(
        || {
            let opts = connect_options(kind, url.clone());
            async move { Database::connect(opts).await.map_err(AppError::from) }
        },
        CONNECT_ATTEMPTS,
        CONNECT_INTERVAL_MS,
    )
    .await?;

    if kind != DbKind::Postgres {
        conn.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        conn.execute_unprepared("PRAGMA busy_timeout = 5000;").await?;
    }

    info!(engine = engine(kind), ?profile, ?owner, "database connected");
    Ok(conn)
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(
    kind: DbKind,
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(kind, profile, owner).await?;
    migrate(&conn, MigrationCommand::Up).await?;
    info!(engine = engine(kind), "schema up to date");
    Ok(conn)
}
