//! Domain layer: pure battle rules, no database or HTTP.

pub mod ban;
pub mod cards;
pub mod effects;
pub mod health;
pub mod invitation;
pub mod lobby;
pub mod resolver;
pub mod role;
pub mod rules;
pub mod turn;

pub use cards::CardKind;
pub use effects::{ActiveEffect, Effect, EffectKind, EffectLedger};
pub use health::Health;
pub use role::{Role, Seats};
