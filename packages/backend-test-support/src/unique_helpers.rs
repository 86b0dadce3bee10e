//! Unique test data, so tests sharing a database never collide.

use std::sync::atomic::{AtomicI64, Ordering};

use uuid::Uuid;

static NEXT_USER_ID: AtomicI64 = AtomicI64::new(1_000);

/// `{prefix}-{uuid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// An eight character upper-case lobby code. The leading letter keeps it
/// from ever reading as a numeric session id.
pub fn unique_lobby_code() -> String {
    let tail = Uuid::new_v4().simple().to_string()[..7].to_ascii_uppercase();
    format!("T{tail}")
}

/// Monotonic user id, offset by process id so parallel binaries differ.
pub fn unique_user_id() -> i64 {
    let base = i64::from(std::process::id()) * 1_000_000;
    base + NEXT_USER_ID.fetch_add(1, Ordering::Relaxed)
}
