use battle_backend::config::db::{DbKind, DbProfile};
use battle_backend::infra::state::build_state;
use battle_backend::state::app_state::AppState;

/// Database for integration tests. Defaults to a private in-memory SQLite
/// per state; `BATTLE_TEST_DB_KIND=postgres` runs against the `_test`
/// Postgres database instead.
pub fn test_db_kind() -> DbKind {
    std::env::var("BATTLE_TEST_DB_KIND")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DbKind::SqliteMemory)
}

/// Fresh, migrated state with local-only realtime.
pub async fn build_test_state() -> AppState {
    build_state()
        .with_db(test_db_kind())
        .with_profile(DbProfile::Test)
        .build()
        .await
        .expect("test state should build")
}
