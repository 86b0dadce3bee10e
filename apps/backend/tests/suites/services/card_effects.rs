use battle_backend::db::txn::with_txn;
use battle_backend::domain::rules::{
    INCORRECT_ANSWER_DAMAGE, MAX_HEALTH, POISON_DAMAGE_PER_TURN, POISON_INITIAL_DAMAGE,
    POISON_TURNS, REGENERATION_HEAL,
};
use battle_backend::domain::{CardKind, EffectKind, Role};
use battle_backend::errors::ErrorCode;
use battle_backend::services::rounds::RoundService;

use crate::support::factory::{play, started_battle};
use crate::support::test_state::build_test_state;

#[actix_web::test]
async fn poison_hits_then_decays_over_target_turns() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    let cast = play(&state, &session, Role::Host, Some(CardKind::Poison), true)
        .await
        .unwrap();
    assert_eq!(cast.score.guest_health, MAX_HEALTH - POISON_INITIAL_DAMAGE);
    assert!(cast
        .session
        .active_card_effects
        .has_pending(Role::Guest, EffectKind::Poison));

    let mut expected = MAX_HEALTH - POISON_INITIAL_DAMAGE;
    for _ in 0..POISON_TURNS {
        let tick = play(&state, &session, Role::Guest, None, true).await.unwrap();
        expected -= POISON_DAMAGE_PER_TURN;
        assert_eq!(tick.outcome.poison_damage, POISON_DAMAGE_PER_TURN);
        assert_eq!(tick.score.guest_health, expected);
        play(&state, &session, Role::Host, None, true).await.unwrap();
    }

    // Exhausted: no further damage, effect pruned.
    let done = play(&state, &session, Role::Guest, None, true).await.unwrap();
    assert_eq!(done.outcome.poison_damage, 0);
    assert_eq!(done.score.guest_health, expected);
    assert!(done.session.active_card_effects.as_slice().is_empty());
}

#[actix_web::test]
async fn quick_draw_keeps_the_turn_only_when_correct() {
    let state = build_test_state().await;
    let (pair, session) = started_battle(&state).await;

    let hit = play(&state, &session, Role::Host, Some(CardKind::QuickDraw), true)
        .await
        .unwrap();
    assert_eq!(hit.outcome.next_turn, pair.host_id);
    assert_eq!(hit.outcome.card_applied, Some(CardKind::QuickDraw));

    let miss = play(&state, &session, Role::Host, Some(CardKind::QuickDraw), false)
        .await
        .unwrap();
    assert_eq!(miss.outcome.next_turn, pair.guest_id);
    assert_eq!(miss.outcome.card_applied, None);
    assert_eq!(miss.score.host_health, MAX_HEALTH - INCORRECT_ANSWER_DAMAGE);
}

#[actix_web::test]
async fn mind_control_locks_cards_for_one_turn() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    play(&state, &session, Role::Host, Some(CardKind::MindControl), true)
        .await
        .unwrap();

    let locked = play(&state, &session, Role::Guest, Some(CardKind::Poison), true)
        .await
        .unwrap_err();
    assert_eq!(locked.code(), ErrorCode::CardLocked);

    let plain = play(&state, &session, Role::Guest, None, true).await.unwrap();
    assert!(!plain
        .session
        .active_card_effects
        .has_pending(Role::Guest, EffectKind::MindControl));

    play(&state, &session, Role::Host, None, true).await.unwrap();
    let free = play(&state, &session, Role::Guest, Some(CardKind::Regeneration), true).await;
    assert!(free.is_ok());
}

#[actix_web::test]
async fn answer_shield_blocks_the_next_card() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    play(&state, &session, Role::Host, Some(CardKind::AnswerShield), true)
        .await
        .unwrap();

    let blocked = play(&state, &session, Role::Guest, Some(CardKind::Poison), true)
        .await
        .unwrap();
    assert!(blocked.outcome.blocked);
    assert_eq!(blocked.outcome.card_applied, None);
    assert_eq!(blocked.score.host_health, MAX_HEALTH);
}

#[actix_web::test]
async fn regeneration_heals_up_to_max() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    play(&state, &session, Role::Host, None, false).await.unwrap();
    play(&state, &session, Role::Guest, None, true).await.unwrap();
    let healed = play(&state, &session, Role::Host, Some(CardKind::Regeneration), true)
        .await
        .unwrap();
    assert_eq!(
        healed.score.host_health,
        (MAX_HEALTH - INCORRECT_ANSWER_DAMAGE + REGENERATION_HEAL).min(MAX_HEALTH)
    );
}

#[actix_web::test]
async fn pending_effect_is_consumed_once() {
    let state = build_test_state().await;
    let (_, session) = started_battle(&state).await;

    let cast = play(&state, &session, Role::Host, Some(CardKind::TimeManipulation), true)
        .await
        .unwrap();
    let effect_id = cast
        .session
        .active_card_effects
        .pending_for(Role::Guest)
        .next()
        .map(|e| e.id)
        .expect("time reduction pending for guest");

    let uuid = session.session_uuid;
    let consumed = with_txn(&state, |txn| {
        Box::pin(async move {
            RoundService::new()
                .consume_effect(txn, uuid, Role::Guest, EffectKind::TimeReduction, Some(effect_id))
                .await
        })
    })
    .await
    .unwrap();
    assert_eq!(consumed.consumed.id, effect_id);
    assert!(consumed.consumed.used);
    assert!(consumed.session.active_card_effects.as_slice().is_empty());

    let again = with_txn(&state, |txn| {
        Box::pin(async move {
            RoundService::new()
                .consume_effect(txn, uuid, Role::Guest, EffectKind::TimeReduction, None)
                .await
        })
    })
    .await
    .unwrap_err();
    assert_eq!(again.code(), ErrorCode::NotFound);
}
