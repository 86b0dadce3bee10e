pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};

mod m20251018_000001_battle;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20251018_000001_battle::Migration)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

impl std::str::FromStr for MigrationCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "fresh" => Ok(Self::Fresh),
            "reset" => Ok(Self::Reset),
            "refresh" => Ok(Self::Refresh),
            "status" => Ok(Self::Status),
            other => Err(format!(
                "unknown command '{other}'; use up | down | fresh | reset | refresh | status"
            )),
        }
    }
}

/// Run `command` against an open connection. Shared by the CLI and the
/// backend's startup bootstrap.
pub async fn migrate(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    let database = database_name(db).await?;
    let before = count_applied_migrations(db).await.unwrap_or(0);
    tracing::info!(
        ?command,
        backend = ?db.get_database_backend(),
        %database,
        defined = Migrator::migrations().len(),
        applied = before,
        "migration starting"
    );

    let result = match command {
        MigrationCommand::Up => Migrator::up(db, None).await,
        MigrationCommand::Down => Migrator::down(db, None).await,
        MigrationCommand::Fresh => Migrator::fresh(db).await,
        MigrationCommand::Reset => Migrator::reset(db).await,
        MigrationCommand::Refresh => Migrator::refresh(db).await,
        MigrationCommand::Status => Migrator::status(db).await,
    };

    match result {
        Ok(()) => {
            let after = count_applied_migrations(db).await.unwrap_or(0);
            tracing::info!(?command, %database, applied = after, "migration finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!(?command, %database, error = %e, "migration failed");
            Err(e)
        }
    }
}

async fn database_name(db: &DatabaseConnection) -> Result<String, DbErr> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Postgres => "SELECT current_database() AS name",
        DatabaseBackend::Sqlite => "SELECT file AS name FROM pragma_database_list WHERE name = 'main'",
        _ => return Ok("<unsupported>".to_string()),
    };
    let row = db
        .query_one(Statement::from_string(backend, sql.to_string()))
        .await?;
    Ok(match row.and_then(|r| r.try_get::<String>("", "name").ok()) {
        Some(name) if name.is_empty() => ":memory:".to_string(),
        Some(name) => name,
        None => "<unknown>".to_string(),
    })
}

/// Applied migrations; 0 before the tracking table exists.
pub async fn count_applied_migrations(db: &DatabaseConnection) -> Result<usize, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Name of the newest applied migration, if any.
pub async fn get_latest_migration_version(
    db: &DatabaseConnection,
) -> Result<Option<String>, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.last().map(|m| m.name().to_string())),
        Err(DbErr::Exec(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
