use battle_backend::config::db::{DbKind, DbOwner, DbProfile};
use battle_backend::connect_db;
use clap::{Parser, ValueEnum};
use migration::{migrate, MigrationCommand};

#[derive(Clone, Copy, ValueEnum)]
enum Env {
    Prod,
    Test,
}

/// In-memory SQLite is not offered: the schema would vanish when the
/// command exits.
#[derive(Clone, Copy, ValueEnum)]
enum Db {
    Postgres,
    SqliteFile,
}

#[derive(Parser)]
#[command(name = "migration-cli", about = "Battle backend database migrations")]
struct Args {
    /// up | down | fresh | reset | refresh | status
    command: MigrationCommand,

    #[arg(short, long, value_enum, default_value = "test")]
    env: Env,

    #[arg(short, long, value_enum, default_value = "postgres")]
    db: Db,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter("migration=info,battle_backend=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let profile = match args.env {
        Env::Prod => DbProfile::Prod,
        Env::Test => DbProfile::Test,
    };
    let kind = match args.db {
        Db::Postgres => DbKind::Postgres,
        Db::SqliteFile => DbKind::SqliteFile,
    };

    let conn = match connect_db(kind, profile, DbOwner::Owner).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Connection failed: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migrate(&conn, args.command).await {
        eprintln!("Migration failed: {e}");
        std::process::exit(1);
    }
}
