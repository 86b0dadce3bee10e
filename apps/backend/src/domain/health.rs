use serde::{Deserialize, Serialize};

use super::role::Role;
use super::rules::{MAX_HEALTH, MIN_HEALTH};

/// Apply `delta` to `current`, clamped to `[MIN_HEALTH, MAX_HEALTH]`.
pub fn apply_delta(current: i32, delta: i32) -> i32 {
    current.saturating_add(delta).clamp(MIN_HEALTH, MAX_HEALTH)
}

/// Health pools of both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub host: i32,
    pub guest: i32,
}

impl Default for Health {
    fn default() -> Self {
        Self::full()
    }
}

impl Health {
    pub fn full() -> Self {
        Self {
            host: MAX_HEALTH,
            guest: MAX_HEALTH,
        }
    }

    pub fn new(host: i32, guest: i32) -> Self {
        Self {
            host: host.clamp(MIN_HEALTH, MAX_HEALTH),
            guest: guest.clamp(MIN_HEALTH, MAX_HEALTH),
        }
    }

    pub fn get(&self, role: Role) -> i32 {
        match role {
            Role::Host => self.host,
            Role::Guest => self.guest,
        }
    }

    pub fn apply(&mut self, role: Role, delta: i32) -> i32 {
        let slot = match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        };
        *slot = apply_delta(*slot, delta);
        *slot
    }

    /// Sides whose health reached the floor.
    pub fn knocked_out(&self) -> Knockout {
        match (self.host <= MIN_HEALTH, self.guest <= MIN_HEALTH) {
            (false, false) => Knockout::None,
            (true, false) => Knockout::One(Role::Host),
            (false, true) => Knockout::One(Role::Guest),
            (true, true) => Knockout::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knockout {
    None,
    One(Role),
    Both,
}
