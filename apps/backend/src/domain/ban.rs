//! Early-leave counting and temporary bans.
//!
//! Bans are never expired by a background job; [`check`] clears a lapsed
//! ban the first time it is observed.

use serde::Serialize;
use time::OffsetDateTime;

use super::rules::{BAN_DURATION, EARLY_LEAVE_BAN_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BanState {
    pub early_leaves: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ban_until: Option<OffsetDateTime>,
}

impl BanState {
    pub fn is_banned(&self, now: OffsetDateTime) -> bool {
        self.ban_until.is_some_and(|until| until > now)
    }
}

/// Count one early leave; reaching the threshold bans for [`BAN_DURATION`].
/// The counter keeps accumulating past the threshold.
pub fn record_early_leave(state: BanState, now: OffsetDateTime) -> BanState {
    let early_leaves = state.early_leaves.saturating_add(1);
    let ban_until = if early_leaves >= EARLY_LEAVE_BAN_THRESHOLD {
        Some(now + BAN_DURATION)
    } else {
        state.ban_until
    };
    BanState {
        early_leaves,
        ban_until,
    }
}

/// Lazily clear a lapsed ban. Returns the effective state and whether it
/// changed (and so must be persisted).
pub fn check(state: BanState, now: OffsetDateTime) -> (BanState, bool) {
    match state.ban_until {
        Some(until) if until <= now => (
            BanState {
                early_leaves: 0,
                ban_until: None,
            },
            true,
        ),
        _ => (state, false),
    }
}
