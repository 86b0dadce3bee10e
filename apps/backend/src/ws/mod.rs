//! Realtime sync layer.
//!
//! Events are refetch hints; persisted state stays authoritative. Publishing
//! is best effort: failures are logged and never reach the caller.

pub mod broker;
pub mod hub;
pub mod protocol;
pub mod session;

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::ws::broker::{Envelope, RealtimeBroker};
use crate::ws::hub::PresenceRegistry;
use crate::ws::protocol::{Room, ServerMsg};

pub struct Realtime {
    presence: Arc<PresenceRegistry>,
    broker: Option<Arc<RealtimeBroker>>,
}

impl Realtime {
    /// Single-instance delivery straight to local sockets.
    pub fn local() -> Self {
        Self {
            presence: Arc::new(PresenceRegistry::new()),
            broker: None,
        }
    }

    /// Fan out through Redis so every instance delivers to its own sockets.
    pub async fn with_redis(redis_url: &str) -> Result<Self, AppError> {
        let presence = Arc::new(PresenceRegistry::new());
        let broker = RealtimeBroker::connect(redis_url, presence.clone()).await?;
        Ok(Self {
            presence,
            broker: Some(broker),
        })
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub async fn publish(&self, room: Room, event: ServerMsg) {
        self.publish_except(room, event, None).await;
    }

    pub async fn to_user(&self, user_id: i64, event: ServerMsg) {
        self.publish(Room::user(user_id), event).await;
    }

    pub async fn to_lobby(&self, lobby_code: &str, event: ServerMsg) {
        self.publish(Room::lobby(lobby_code), event).await;
    }

    pub(crate) async fn publish_except(&self, room: Room, event: ServerMsg, except: Option<Uuid>) {
        match &self.broker {
            Some(broker) => {
                let envelope = Envelope {
                    room,
                    event,
                    except,
                };
                if let Err(err) = broker.publish(&envelope).await {
                    warn!(error = %err, room = ?envelope.room, "Realtime publish failed");
                }
            }
            None => {
                let delivered = self.presence.broadcast(&room, &event, except);
                debug!(room = ?room, delivered, "Realtime event delivered locally");
            }
        }
    }

    /// Track which battle a user is in so a reconnect can resume it.
    pub fn mark_in_battle(&self, user_id: i64, lobby_code: &str, in_battle: bool) {
        if in_battle {
            self.presence.set_in_game(user_id, lobby_code);
        } else {
            self.presence.remove_in_game(user_id, lobby_code);
        }
    }
}
