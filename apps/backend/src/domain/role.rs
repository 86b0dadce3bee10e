use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::domain::DomainError;

/// Seat of a participant in a lobby or battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Guest => "guest",
        }
    }

    /// Seat held by `user_id`, if any.
    pub fn of(user_id: i64, host_id: i64, guest_id: Option<i64>) -> Option<Role> {
        if user_id == host_id {
            Some(Role::Host)
        } else if guest_id == Some(user_id) {
            Some(Role::Guest)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "guest" => Ok(Role::Guest),
            other => Err(DomainError::validation(format!(
                "role must be 'host' or 'guest', got '{other}'"
            ))),
        }
    }
}

/// The two participant ids of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seats {
    pub host_id: i64,
    pub guest_id: i64,
}

impl Seats {
    pub fn id_of(&self, role: Role) -> i64 {
        match role {
            Role::Host => self.host_id,
            Role::Guest => self.guest_id,
        }
    }

    pub fn role_of(&self, user_id: i64) -> Option<Role> {
        Role::of(user_id, self.host_id, Some(self.guest_id))
    }
}
