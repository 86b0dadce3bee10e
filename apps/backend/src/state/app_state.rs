use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::ws::Realtime;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection (absent in some tests)
    pub db: Option<DatabaseConnection>,
    /// Realtime publisher and presence registry
    pub realtime: Arc<Realtime>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, realtime: Arc<Realtime>) -> Self {
        Self {
            db: Some(db),
            realtime,
        }
    }

    pub fn without_db(realtime: Arc<Realtime>) -> Self {
        Self { db: None, realtime }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    pub fn realtime(&self) -> &Realtime {
        &self.realtime
    }
}
