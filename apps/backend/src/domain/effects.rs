//! Active card effects.
//!
//! Effects are stored on the session as an ordered list. Consumers ask for
//! pending effects targeting a role and must mark them used explicitly;
//! nothing here expires an effect on read.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::cards::CardKind;
use super::role::Role;
use super::rules::{
    MIND_CONTROL_TURNS, MIN_ANSWER_WINDOW_SECS, POISON_DAMAGE_PER_TURN, POISON_TURNS,
    REGENERATION_HEAL, TIME_REDUCTION_PERCENT,
};
use crate::errors::domain::{DomainError, InfraErrorKind, NotFoundKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Target's next answer window shrinks by `percent`, never below `min_seconds`.
    TimeReduction { percent: u32, min_seconds: u32 },
    /// Current player keeps the turn.
    ExtraTurn,
    /// Target's next card play is cancelled.
    Block,
    /// Immediate heal of the card's owner.
    Heal { amount: i32 },
    /// Target may not play a card for `turns_remaining` turns.
    MindControl { turns_remaining: u32 },
    /// Damage at the start of each of the target's turns. `applied_turns`
    /// holds the turn numbers already charged.
    Poison {
        damage_per_turn: i32,
        turns_remaining: u32,
        applied_turns: BTreeSet<u32>,
    },
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::TimeReduction { .. } => EffectKind::TimeReduction,
            Effect::ExtraTurn => EffectKind::ExtraTurn,
            Effect::Block => EffectKind::Block,
            Effect::Heal { .. } => EffectKind::Heal,
            Effect::MindControl { .. } => EffectKind::MindControl,
            Effect::Poison { .. } => EffectKind::Poison,
        }
    }

    pub fn time_reduction() -> Self {
        Effect::TimeReduction {
            percent: TIME_REDUCTION_PERCENT,
            min_seconds: MIN_ANSWER_WINDOW_SECS,
        }
    }

    pub fn heal() -> Self {
        Effect::Heal {
            amount: REGENERATION_HEAL,
        }
    }

    pub fn mind_control() -> Self {
        Effect::MindControl {
            turns_remaining: MIND_CONTROL_TURNS,
        }
    }

    pub fn poison() -> Self {
        Effect::Poison {
            damage_per_turn: POISON_DAMAGE_PER_TURN,
            turns_remaining: POISON_TURNS,
            applied_turns: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    TimeReduction,
    ExtraTurn,
    Block,
    Heal,
    MindControl,
    Poison,
}

impl EffectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::TimeReduction => "time_reduction",
            EffectKind::ExtraTurn => "extra_turn",
            EffectKind::Block => "block",
            EffectKind::Heal => "heal",
            EffectKind::MindControl => "mind_control",
            EffectKind::Poison => "poison",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            EffectKind::TimeReduction,
            EffectKind::ExtraTurn,
            EffectKind::Block,
            EffectKind::Heal,
            EffectKind::MindControl,
            EffectKind::Poison,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| DomainError::validation(format!("unknown effect kind '{s}'")))
    }
}

/// One effect instance on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: Uuid,
    pub target: Role,
    pub source_card: CardKind,
    #[serde(with = "time::serde::rfc3339")]
    pub applied_at: OffsetDateTime,
    pub used: bool,
    pub effect: Effect,
}

impl ActiveEffect {
    pub fn is_pending_for(&self, target: Role) -> bool {
        !self.used && self.target == target
    }
}

/// Ordered list of effect instances for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectLedger {
    effects: Vec<ActiveEffect>,
}

impl EffectLedger {
    pub fn new(effects: Vec<ActiveEffect>) -> Self {
        Self { effects }
    }

    /// Decode the stored JSON list; `null` decodes as empty.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DomainError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map(Self::new)
            .map_err(|e| {
                DomainError::infra(
                    InfraErrorKind::DataCorruption,
                    format!("active_card_effects does not decode: {e}"),
                )
            })
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.effects).unwrap_or_else(|_| serde_json::Value::Array(vec![]))
    }

    pub fn as_slice(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn into_vec(self) -> Vec<ActiveEffect> {
        self.effects
    }

    pub fn pending_for(&self, target: Role) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter().filter(move |e| e.is_pending_for(target))
    }

    pub fn has_pending(&self, target: Role, kind: EffectKind) -> bool {
        self.pending_for(target).any(|e| e.effect.kind() == kind)
    }

    /// Append a new pending effect and return its id.
    pub fn push(
        &mut self,
        target: Role,
        source_card: CardKind,
        effect: Effect,
        now: OffsetDateTime,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.effects.push(ActiveEffect {
            id,
            target,
            source_card,
            applied_at: now,
            used: false,
            effect,
        });
        id
    }

    /// Consume one pending effect targeting `target`: the instance named by
    /// `id` when given, otherwise the oldest pending one of `kind`.
    ///
    /// Mind-control decrements its counter and is used once it hits zero;
    /// every other kind is used immediately.
    pub fn consume(
        &mut self,
        target: Role,
        kind: EffectKind,
        id: Option<Uuid>,
    ) -> Result<ActiveEffect, DomainError> {
        let slot = self
            .effects
            .iter_mut()
            .filter(|e| e.is_pending_for(target) && e.effect.kind() == kind)
            .find(|e| id.map_or(true, |wanted| e.id == wanted))
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Other("Effect".into()),
                    format!("no pending {kind} effect for {target}"),
                )
            })?;

        match &mut slot.effect {
            Effect::MindControl { turns_remaining } => {
                *turns_remaining = turns_remaining.saturating_sub(1);
                slot.used = *turns_remaining == 0;
            }
            Effect::Poison {
                turns_remaining, ..
            } => {
                *turns_remaining = 0;
                slot.used = true;
            }
            _ => slot.used = true,
        }
        Ok(slot.clone())
    }

    /// Charge every pending poison on `target` for `turn_no`. A turn number
    /// already recorded on an instance is skipped, so retries never double-charge.
    /// Returns the total damage (positive).
    pub fn charge_poison(&mut self, target: Role, turn_no: u32) -> i32 {
        let mut damage = 0;
        for entry in self.effects.iter_mut().filter(|e| e.is_pending_for(target)) {
            if let Effect::Poison {
                damage_per_turn,
                turns_remaining,
                applied_turns,
            } = &mut entry.effect
            {
                if *turns_remaining == 0 || !applied_turns.insert(turn_no) {
                    continue;
                }
                *turns_remaining -= 1;
                damage += *damage_per_turn;
                if *turns_remaining == 0 {
                    entry.used = true;
                }
            }
        }
        damage
    }

    /// Drop used instances.
    pub fn prune_used(&mut self) {
        self.effects.retain(|e| !e.used);
    }
}

/// Answer window for `target` given its pending effects: a pending time
/// reduction shortens `base_secs` by its percentage, floored at its minimum
/// and never longer than `base_secs`.
pub fn answer_window(base_secs: u32, ledger: &EffectLedger, target: Role) -> u32 {
    let reduction = ledger.pending_for(target).find_map(|e| match e.effect {
        Effect::TimeReduction {
            percent,
            min_seconds,
        } => Some((percent, min_seconds)),
        _ => None,
    });

    match reduction {
        None => base_secs,
        Some((percent, min_seconds)) => {
            let reduced = base_secs.saturating_mul(100 - percent.min(100)) / 100;
            reduced.max(min_seconds).min(base_secs)
        }
    }
}
