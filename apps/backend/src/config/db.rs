use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Which database engine backs the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    /// Private in-memory SQLite database (one connection, used by tests)
    SqliteMemory,
    /// SQLite file at `SQLITE_DB_PATH`
    SqliteFile,
}

impl FromStr for DbKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(DbKind::Postgres),
            "sqlite-memory" | "sqlite_memory" | "memory" => Ok(DbKind::SqliteMemory),
            "sqlite-file" | "sqlite_file" | "sqlite" => Ok(DbKind::SqliteFile),
            other => Err(AppError::config(format!("unknown database kind '{other}'"))),
        }
    }
}

/// Database profile for different environments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbProfile {
    Prod,
    /// Test profile; database name must end in `_test`
    Test,
}

/// Database role used for the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOwner {
    /// Application role (DML only)
    App,
    /// Owner role (runs migrations)
    Owner,
}

/// Connection URL for `kind` under the given profile/owner.
pub fn db_url(kind: DbKind, profile: DbProfile, owner: DbOwner) -> Result<String, AppError> {
    match kind {
        DbKind::Postgres => postgres_url(profile, owner),
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
        DbKind::SqliteFile => {
            let path = must_var("SQLITE_DB_PATH")?;
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
    }
}

fn postgres_url(profile: DbProfile, owner: DbOwner) -> Result<String, AppError> {
    let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let db_name = db_name(profile)?;
    let (username, password) = credentials(owner)?;

    Ok(format!(
        "postgresql://{username}:{password}@{host}:{port}/{db_name}"
    ))
}

fn db_name(profile: DbProfile) -> Result<String, AppError> {
    match profile {
        DbProfile::Prod => must_var("PROD_DB"),
        DbProfile::Test => {
            let db_name = must_var("TEST_DB")?;
            if !db_name.ends_with("_test") {
                return Err(AppError::config(format!(
                    "Test profile requires database name to end with '_test', but got: '{db_name}'"
                )));
            }
            Ok(db_name)
        }
    }
}

fn credentials(owner: DbOwner) -> Result<(String, String), AppError> {
    match owner {
        DbOwner::App => Ok((must_var("APP_DB_USER")?, must_var("APP_DB_PASSWORD")?)),
        DbOwner::Owner => Ok((
            must_var("BATTLE_OWNER_USER")?,
            must_var("BATTLE_OWNER_PASSWORD")?,
        )),
    }
}

fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
