use std::sync::Arc;

use crate::config::db::{DbKind, DbOwner, DbProfile};
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::ws::Realtime;

/// Builder for `AppState`, shared by `main` and the test harness.
pub struct StateBuilder {
    db_kind: Option<DbKind>,
    profile: DbProfile,
    redis_url: Option<String>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            db_kind: None,
            profile: DbProfile::Prod,
            redis_url: None,
        }
    }

    pub fn with_db(mut self, kind: DbKind) -> Self {
        self.db_kind = Some(kind);
        self
    }

    pub fn with_profile(mut self, profile: DbProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_redis(mut self, url: Option<String>) -> Self {
        self.redis_url = url;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let realtime = match self.redis_url.as_deref() {
            Some(url) => Realtime::with_redis(url).await?,
            None => Realtime::local(),
        };
        let realtime = Arc::new(realtime);

        match self.db_kind {
            Some(kind) => {
                let conn = bootstrap_db(kind, self.profile, DbOwner::App).await?;
                Ok(AppState::new(conn, realtime))
            }
            None => Ok(AppState::without_db(realtime)),
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
