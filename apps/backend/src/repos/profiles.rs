//! Battle-owned slice of user profiles.

use sea_orm::ConnectionTrait;
use time::OffsetDateTime;

use crate::adapters::profiles_sea as profiles_adapter;
use crate::domain::ban::BanState;
use crate::entities::user_profiles;
use crate::errors::domain::{DomainError, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: i64,
    pub username: String,
    pub level: i32,
    pub early_leaves: i32,
    pub ban_until: Option<OffsetDateTime>,
    pub win_streak: i32,
}

impl Profile {
    pub fn ban_state(&self) -> BanState {
        BanState {
            early_leaves: self.early_leaves,
            ban_until: self.ban_until,
        }
    }
}

pub async fn find_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<Profile>, DomainError> {
    let profile = profiles_adapter::find_by_user(conn, user_id).await?;
    Ok(profile.map(Profile::from))
}

pub async fn require_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Profile, DomainError> {
    find_by_user(conn, user_id).await?.ok_or_else(|| {
        DomainError::not_found(NotFoundKind::User, format!("User {user_id} not found"))
    })
}

pub async fn save_ban_state<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    state: BanState,
) -> Result<(), DomainError> {
    profiles_adapter::set_ban_state(conn, user_id, state.early_leaves, state.ban_until).await?;
    Ok(())
}

/// Winner +1, loser reset. Users without a profile row are skipped.
pub async fn record_result<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    winner_id: i64,
    loser_id: Option<i64>,
) -> Result<(), DomainError> {
    profiles_adapter::increment_win_streak(conn, winner_id).await?;
    if let Some(loser_id) = loser_id {
        profiles_adapter::reset_win_streak(conn, loser_id).await?;
    }
    Ok(())
}

impl From<user_profiles::Model> for Profile {
    fn from(model: user_profiles::Model) -> Self {
        Self {
            user_id: model.user_id,
            username: model.username,
            level: model.level,
            early_leaves: model.early_leaves,
            ban_until: model.ban_until,
            win_streak: model.win_streak,
        }
    }
}
