//! Turn resolution: one play against the current battle state.
//!
//! [`resolve_play`] works on an in-memory [`TurnState`]; the caller loads it,
//! persists the mutated state and outcome in one transaction, and throws the
//! state away on error.

use serde::Serialize;
use time::OffsetDateTime;

use super::cards::CardKind;
use super::effects::{Effect, EffectKind, EffectLedger};
use super::health::{Health, Knockout};
use super::role::{Role, Seats};
use super::rules::{INCORRECT_ANSWER_DAMAGE, POISON_INITIAL_DAMAGE};
use crate::errors::domain::{DomainError, InvalidStateKind};

#[derive(Debug, Clone, PartialEq)]
pub struct TurnState {
    pub seats: Seats,
    /// User id whose move it is; `None` until the battle starts.
    pub current_turn: Option<i64>,
    pub question_count_total: u32,
    pub effects: EffectLedger,
    pub health: Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Play {
    pub role: Role,
    pub card: Option<CardKind>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayOutcome {
    pub turn_number: u32,
    pub card_played: Option<CardKind>,
    /// Card whose effect actually took place.
    pub card_applied: Option<CardKind>,
    pub blocked: bool,
    /// Effect produced by this play, recorded on the round.
    pub effect: Option<Effect>,
    pub poison_damage: i32,
    pub answer_damage: i32,
    pub next_role: Role,
    pub next_turn: i64,
    #[serde(skip)]
    pub knockout: Knockout,
}

/// Resolve one play, mutating `state` in place.
pub fn resolve_play(
    state: &mut TurnState,
    play: Play,
    now: OffsetDateTime,
) -> Result<PlayOutcome, DomainError> {
    let role = play.role;
    let opponent = role.other();

    let expected = state.current_turn.ok_or_else(|| {
        DomainError::invalid_state(InvalidStateKind::BattleNotStarted, "battle has not started")
    })?;
    if expected != state.seats.id_of(role) {
        return Err(DomainError::invalid_state(
            InvalidStateKind::OutOfTurn,
            format!("it is not the {role}'s turn"),
        ));
    }

    let mind_controlled = state.effects.has_pending(role, EffectKind::MindControl);
    if mind_controlled && play.card.is_some() {
        return Err(DomainError::invalid_state(
            InvalidStateKind::CardLocked,
            "mind control: no card may be played this turn",
        ));
    }

    let turn_number = state.question_count_total + 1;

    let poison_damage = state.effects.charge_poison(role, turn_number);
    if poison_damage > 0 {
        state.health.apply(role, -poison_damage);
    }

    if mind_controlled {
        state.effects.consume(role, EffectKind::MindControl, None)?;
    }

    let mut blocked = false;
    let mut card = play.card;
    if card.is_some() && state.effects.has_pending(role, EffectKind::Block) {
        state.effects.consume(role, EffectKind::Block, None)?;
        blocked = true;
        card = None;
    }

    // The turn the reduction applied to has now been played.
    if state.effects.has_pending(role, EffectKind::TimeReduction) {
        state.effects.consume(role, EffectKind::TimeReduction, None)?;
    }

    let mut effect = None;
    let mut extra_turn = false;
    let mut answer_damage = 0;
    let mut card_applied = None;

    if play.is_correct {
        if let Some(kind) = card {
            card_applied = Some(kind);
            effect = Some(match kind {
                CardKind::TimeManipulation => {
                    let e = Effect::time_reduction();
                    state.effects.push(opponent, kind, e.clone(), now);
                    e
                }
                CardKind::QuickDraw => {
                    extra_turn = true;
                    Effect::ExtraTurn
                }
                CardKind::AnswerShield => {
                    state.effects.push(opponent, kind, Effect::Block, now);
                    Effect::Block
                }
                CardKind::Regeneration => {
                    let e = Effect::heal();
                    if let Effect::Heal { amount } = e {
                        state.health.apply(role, amount);
                    }
                    e
                }
                CardKind::MindControl => {
                    let e = Effect::mind_control();
                    state.effects.push(opponent, kind, e.clone(), now);
                    e
                }
                CardKind::Poison => {
                    state.health.apply(opponent, -POISON_INITIAL_DAMAGE);
                    let e = Effect::poison();
                    state.effects.push(opponent, kind, e.clone(), now);
                    e
                }
            });
        }
    } else {
        answer_damage = INCORRECT_ANSWER_DAMAGE;
        state.health.apply(role, -INCORRECT_ANSWER_DAMAGE);
    }

    let next_role = if extra_turn { role } else { opponent };
    let next_turn = state.seats.id_of(next_role);
    state.current_turn = Some(next_turn);
    state.question_count_total = turn_number;
    state.effects.prune_used();

    Ok(PlayOutcome {
        turn_number,
        card_played: play.card,
        card_applied,
        blocked,
        effect,
        poison_damage,
        answer_damage,
        next_role,
        next_turn,
        knockout: state.health.knocked_out(),
    })
}
