//! Early-leave accounting and ban checks.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::ban::{self, BanState};
use crate::error::AppError;
use crate::errors::domain::{DomainError, InvalidStateKind};
use crate::repos::profiles;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanStatus {
    pub user_id: i64,
    pub banned: bool,
    pub early_leaves: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ban_until: Option<OffsetDateTime>,
}

#[derive(Default)]
pub struct BanService;

impl BanService {
    pub fn new() -> Self {
        Self
    }

    /// Current ban status, clearing a lapsed ban on the way.
    pub async fn check<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        user_id: i64,
    ) -> Result<BanStatus, AppError> {
        let profile = profiles::require_by_user(conn, user_id).await?;
        let now = OffsetDateTime::now_utc();
        let (state, changed) = ban::check(profile.ban_state(), now);
        if changed {
            profiles::save_ban_state(conn, user_id, state).await?;
            info!(user_id, "Lapsed ban cleared");
        }
        Ok(BanStatus {
            user_id,
            banned: state.is_banned(now),
            early_leaves: state.early_leaves,
            ban_until: state.ban_until,
        })
    }

    /// Reject a banned user. Users without a profile row are not banned.
    pub async fn ensure_not_banned<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        user_id: i64,
    ) -> Result<(), AppError> {
        if profiles::find_by_user(conn, user_id).await?.is_none() {
            return Ok(());
        }
        let status = self.check(conn, user_id).await?;
        if status.banned {
            warn!(user_id, ban_until = ?status.ban_until, "Banned user rejected");
            return Err(DomainError::invalid_state(
                InvalidStateKind::UserBanned,
                "You are temporarily banned from battles for leaving matches early",
            )
            .into());
        }
        Ok(())
    }

    /// Count one early leave. A missing profile is `NotFound` so the
    /// enclosing transaction rolls back.
    pub async fn record_early_leave<C: ConnectionTrait + Send + Sync>(
        &self,
        conn: &C,
        user_id: i64,
    ) -> Result<BanState, AppError> {
        let profile = profiles::require_by_user(conn, user_id).await?;
        let now = OffsetDateTime::now_utc();
        let (current, _) = ban::check(profile.ban_state(), now);
        let next = ban::record_early_leave(current, now);
        profiles::save_ban_state(conn, user_id, next).await?;
        if next.is_banned(now) {
            warn!(user_id, early_leaves = next.early_leaves, ban_until = ?next.ban_until, "User banned for early leaves");
        } else {
            info!(user_id, early_leaves = next.early_leaves, "Early leave recorded");
        }
        Ok(next)
    }
}
