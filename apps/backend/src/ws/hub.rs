//! Presence registry: the only owner of connection, user, lobby and in-game
//! membership for this instance.

use std::collections::HashSet;

use actix::prelude::*;
use dashmap::DashMap;
use uuid::Uuid;

use crate::ws::protocol::{Room, ServerMsg};

/// Outbound event delivered to one socket actor.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct Deliver(pub ServerMsg);

struct Connection {
    recipient: Recipient<Deliver>,
    user_id: Option<i64>,
    lobbies: HashSet<String>,
}

/// What a connection was part of when it went away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Departure {
    pub user_id: Option<i64>,
    pub lobbies: Vec<String>,
}

/// Per-user view of presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPresence {
    pub user_id: i64,
    pub connections: usize,
    pub lobbies: Vec<String>,
    pub in_game: Option<String>,
}

#[derive(Default)]
pub struct PresenceRegistry {
    connections: DashMap<Uuid, Connection>,
    users: DashMap<i64, HashSet<Uuid>>,
    lobbies: DashMap<String, HashSet<Uuid>>,
    in_game: DashMap<i64, String>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn_id: Uuid, recipient: Recipient<Deliver>) {
        self.connections.insert(
            conn_id,
            Connection {
                recipient,
                user_id: None,
                lobbies: HashSet::new(),
            },
        );
    }

    /// Bind a connection to `user_id`. Rebinding moves it to the new user.
    pub fn bind_user(&self, conn_id: Uuid, user_id: i64) -> bool {
        let previous = {
            let Some(mut conn) = self.connections.get_mut(&conn_id) else {
                return false;
            };
            conn.user_id.replace(user_id)
        };
        if let Some(prev) = previous.filter(|prev| *prev != user_id) {
            self.detach_user(prev, conn_id);
        }
        self.users.entry(user_id).or_default().insert(conn_id);
        true
    }

    pub fn user_of(&self, conn_id: Uuid) -> Option<i64> {
        self.connections.get(&conn_id).and_then(|c| c.user_id)
    }

    pub fn join_lobby(&self, conn_id: Uuid, lobby_code: &str) -> bool {
        {
            let Some(mut conn) = self.connections.get_mut(&conn_id) else {
                return false;
            };
            conn.lobbies.insert(lobby_code.to_string());
        }
        self.lobbies
            .entry(lobby_code.to_string())
            .or_default()
            .insert(conn_id);
        true
    }

    pub fn leave_lobby(&self, conn_id: Uuid, lobby_code: &str) {
        if let Some(mut conn) = self.connections.get_mut(&conn_id) {
            conn.lobbies.remove(lobby_code);
        }
        self.detach_lobby(lobby_code, conn_id);
    }

    /// Remove a connection and report what it belonged to.
    pub fn unregister(&self, conn_id: Uuid) -> Departure {
        let Some((_, conn)) = self.connections.remove(&conn_id) else {
            return Departure::default();
        };
        if let Some(user_id) = conn.user_id {
            self.detach_user(user_id, conn_id);
        }
        let mut lobbies: Vec<String> = conn.lobbies.into_iter().collect();
        lobbies.sort();
        for code in &lobbies {
            self.detach_lobby(code, conn_id);
        }
        Departure {
            user_id: conn.user_id,
            lobbies,
        }
    }

    pub fn get(&self, user_id: i64) -> Option<UserPresence> {
        let conn_ids: Vec<Uuid> = self
            .users
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        let in_game = self.in_game.get(&user_id).map(|code| code.clone());
        if conn_ids.is_empty() && in_game.is_none() {
            return None;
        }
        let mut lobbies: Vec<String> = conn_ids
            .iter()
            .filter_map(|id| self.connections.get(id).map(|c| c.lobbies.clone()))
            .flatten()
            .collect();
        lobbies.sort();
        lobbies.dedup();
        Some(UserPresence {
            user_id,
            connections: conn_ids.len(),
            lobbies,
            in_game,
        })
    }

    pub fn set_in_game(&self, user_id: i64, lobby_code: &str) {
        self.in_game.insert(user_id, lobby_code.to_string());
    }

    /// Clear the in-game marker, only if it still points at `lobby_code`.
    pub fn remove_in_game(&self, user_id: i64, lobby_code: &str) {
        self.in_game.remove_if(&user_id, |_, code| code == lobby_code);
    }

    pub fn in_game(&self, user_id: i64) -> Option<String> {
        self.in_game.get(&user_id).map(|code| code.clone())
    }

    pub fn active_connections_count(&self) -> usize {
        self.connections.len()
    }

    /// Deliver to every local socket in `room`, optionally skipping one.
    pub fn broadcast(&self, room: &Room, msg: &ServerMsg, except: Option<Uuid>) -> usize {
        let targets: Vec<Uuid> = match room {
            Room::User { id } => self
                .users
                .get(id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
            Room::Lobby { code } => self
                .lobbies
                .get(code)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default(),
        };
        let mut delivered = 0;
        for conn_id in targets {
            if Some(conn_id) == except {
                continue;
            }
            if let Some(conn) = self.connections.get(&conn_id) {
                conn.recipient.do_send(Deliver(msg.clone()));
                delivered += 1;
            }
        }
        delivered
    }

    fn detach_user(&self, user_id: i64, conn_id: Uuid) {
        if let Some(mut set) = self.users.get_mut(&user_id) {
            set.remove(&conn_id);
        }
        self.users.remove_if(&user_id, |_, set| set.is_empty());
    }

    fn detach_lobby(&self, lobby_code: &str, conn_id: Uuid) {
        if let Some(mut set) = self.lobbies.get_mut(lobby_code) {
            set.remove(&conn_id);
        }
        self.lobbies.remove_if(lobby_code, |_, set| set.is_empty());
    }
}
