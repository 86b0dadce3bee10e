//! SeaORM -> DomainError translation.
//!
//! Adapters return `sea_orm::DbErr`; services convert through [`map_db_err`]
//! and higher layers map `DomainError` to `AppError` via `From`.

use sea_orm::DbErr;
use tracing::{error, warn};

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::trace_ctx;

/// Prefix of the sentinel raised by version-guarded updates.
pub const OPTIMISTIC_LOCK_PREFIX: &str = "OPTIMISTIC_LOCK:";

fn mentions_sqlstate(msg: &str, code: &str) -> bool {
    msg.contains(code) || msg.contains(&format!("SQLSTATE({code})"))
}

/// True for unique violations on either backend.
pub fn is_unique_violation(e: &DbErr) -> bool {
    let msg = e.to_string();
    mentions_sqlstate(&msg, "23505")
        || msg.contains("duplicate key value violates unique constraint")
        || msg.contains("UNIQUE constraint failed")
}

/// SQLite reports `UNIQUE constraint failed: table.column`.
fn sqlite_table_column(msg: &str) -> Option<&str> {
    let marker = "UNIQUE constraint failed: ";
    let start = msg.find(marker)? + marker.len();
    msg[start..].split([' ', '\n', '"', ',']).next()
}

fn unique_conflict(msg: &str) -> Option<(ConflictKind, &'static str)> {
    let target = sqlite_table_column(msg).unwrap_or(msg);
    if target.contains("lobbies.code") || msg.contains("ux_lobbies_code") {
        return Some((ConflictKind::LobbyCodeTaken, "Lobby code already exists"));
    }
    if target.contains("battle_sessions.lobby_code")
        || msg.contains("ux_battle_sessions_active_lobby")
    {
        return Some((
            ConflictKind::ActiveSessionExists,
            "An active battle session already exists for this lobby",
        ));
    }
    if target.contains("battle_endings.session_uuid") || msg.contains("battle_endings_session_uuid")
    {
        return Some((
            ConflictKind::EndingExists,
            "Battle has already ended",
        ));
    }
    None
}

#[derive(serde::Deserialize)]
struct LockInfo {
    expected: i32,
    actual: i32,
}

/// Build the optimistic-lock sentinel error.
pub fn optimistic_lock_err(expected: i32, actual: i32) -> DbErr {
    DbErr::Custom(format!(
        "{OPTIMISTIC_LOCK_PREFIX}{{\"expected\":{expected},\"actual\":{actual}}}"
    ))
}

/// Translate a `DbErr` into a `DomainError`.
pub fn map_db_err(e: DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        DbErr::RecordNotFound(what) => {
            return DomainError::not_found(NotFoundKind::Other(what.clone()), "Record not found");
        }
        DbErr::Custom(msg) if msg.starts_with(OPTIMISTIC_LOCK_PREFIX) => {
            let info = msg
                .strip_prefix(OPTIMISTIC_LOCK_PREFIX)
                .and_then(|json| serde_json::from_str::<LockInfo>(json).ok());
            return match info {
                Some(info) => {
                    warn!(
                        trace_id = %trace_id,
                        expected = info.expected,
                        actual = info.actual,
                        "Optimistic lock conflict"
                    );
                    DomainError::conflict(
                        ConflictKind::OptimisticLock,
                        format!(
                            "Session was modified concurrently (expected version {}, actual version {}); refresh and retry",
                            info.expected, info.actual
                        ),
                    )
                }
                None => {
                    warn!(trace_id = %trace_id, "Optimistic lock conflict (version info unavailable)");
                    DomainError::conflict(
                        ConflictKind::OptimisticLock,
                        "Session was modified concurrently; refresh and retry",
                    )
                }
            };
        }
        DbErr::Json(_) | DbErr::TryIntoErr { .. } => {
            error!(trace_id = %trace_id, raw_error = %error_msg, "Stored data failed to decode");
            return DomainError::infra(InfraErrorKind::DataCorruption, "Stored data is corrupt");
        }
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, raw_error = %error_msg, "Database unavailable");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if is_unique_violation(&e) {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Unique constraint violation");
        if let Some((kind, detail)) = unique_conflict(&error_msg) {
            return DomainError::conflict(kind, detail);
        }
        return DomainError::conflict(
            ConflictKind::Other("Unique".into()),
            "Unique constraint violation",
        );
    }

    if mentions_sqlstate(&error_msg, "23503") || error_msg.contains("FOREIGN KEY constraint failed")
    {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Foreign key constraint violation");
        return DomainError::validation("Referenced record does not exist");
    }

    if error_msg.contains("database is locked") || error_msg.contains("could not serialize") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Database contention");
        return DomainError::infra(InfraErrorKind::DbUnavailable, "Database busy; retry");
    }

    if error_msg.contains("timeout") || error_msg.contains("timed out") {
        warn!(trace_id = %trace_id, raw_error = %error_msg, "Database timeout");
        return DomainError::infra(InfraErrorKind::Timeout, "Database timeout");
    }

    error!(trace_id = %trace_id, raw_error = %error_msg, "Unhandled database error");
    DomainError::infra(
        InfraErrorKind::Other("DbErr".into()),
        "Database operation failed",
    )
}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        map_db_err(e)
    }
}
