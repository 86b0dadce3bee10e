use std::time::Duration;

use battle_backend::domain::lobby::LobbyStatus;
use battle_backend::ws::protocol::ServerMsg;
use serde_json::json;

use crate::support::test_state::build_test_state;
use crate::support::websocket::{start_test_server, wait_for_lobby_member};
use crate::support::websocket_client::WebSocketClient;

const WAIT: Duration = Duration::from_secs(2);

#[actix_web::test]
async fn lobby_events_reach_the_other_member() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let realtime = state.realtime.clone();
    let server = start_test_server(state).await?;
    let url = server.ws_url();

    let mut host = WebSocketClient::connect_as(&url, 1).await?;
    let mut guest = WebSocketClient::connect_as(&url, 2).await?;

    host.send_json(&json!({ "type": "join_lobby", "lobby_code": "abc123" }))
        .await?;
    wait_for_lobby_member(realtime.presence(), 1, "ABC123", WAIT).await?;

    guest
        .send_json(&json!({
            "type": "join_lobby",
            "lobby_code": "ABC123",
            "player": { "name": "guest" }
        }))
        .await?;
    let joined = host.recv_type("player_joined_lobby").await?;
    assert_eq!(joined["user_id"], 2);
    assert_eq!(joined["lobby_code"], "ABC123");
    assert_eq!(joined["player"]["name"], "guest");
    // The sender is not echoed.
    assert!(guest.is_quiet(Duration::from_millis(200)).await);

    guest
        .send_json(&json!({
            "type": "player_ready_state_changed",
            "lobby_code": "ABC123",
            "is_ready": true
        }))
        .await?;
    let ready = host.recv_type("player_ready_state_changed").await?;
    assert_eq!(ready["user_id"], 2);
    assert_eq!(ready["is_ready"], true);

    host.close().await?;
    guest.close().await?;
    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn server_events_reach_lobby_sockets() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let realtime = state.realtime.clone();
    let server = start_test_server(state).await?;

    let mut client = WebSocketClient::connect_as(&server.ws_url(), 10).await?;
    client
        .send_json(&json!({ "type": "join_lobby", "lobby_code": "ROOM42" }))
        .await?;
    wait_for_lobby_member(realtime.presence(), 10, "ROOM42", WAIT).await?;

    realtime
        .to_lobby(
            "room42",
            ServerMsg::LobbyStatusChanged {
                lobby_code: "ROOM42".into(),
                status: LobbyStatus::Ready,
            },
        )
        .await;
    let event = client.recv_type("lobby_status_changed").await?;
    assert_eq!(event["status"], "ready");

    realtime
        .to_user(
            10,
            ServerMsg::BattleInvitationAccepted {
                lobby_code: "ROOM42".into(),
                sender_id: 10,
                receiver_id: 11,
            },
        )
        .await;
    let accepted = client.recv_type("battle_invitation_accepted").await?;
    assert_eq!(accepted["receiver_id"], 11);

    client.close().await?;
    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn invitations_route_to_the_receiver() -> Result<(), Box<dyn std::error::Error>> {
    let server = start_test_server(build_test_state().await).await?;
    let url = server.ws_url();

    let mut sender = WebSocketClient::connect_as(&url, 21).await?;
    let mut receiver = WebSocketClient::connect_as(&url, 22).await?;

    sender
        .send_json(&json!({
            "type": "battle_invitation",
            "lobby_code": "inv001",
            "receiver_id": 22,
            "payload": { "note": "rematch?" }
        }))
        .await?;
    let sent = sender.recv_type("battle_invitation_sent").await?;
    assert_eq!(sent["receiver_id"], 22);
    let invite = receiver.recv_type("battle_invitation").await?;
    assert_eq!(invite["sender_id"], 21);
    assert_eq!(invite["lobby_code"], "INV001");
    assert_eq!(invite["payload"]["note"], "rematch?");

    receiver
        .send_json(&json!({
            "type": "decline_battle_invitation",
            "lobby_code": "INV001",
            "sender_id": 21
        }))
        .await?;
    let declined = sender.recv_type("battle_invitation_declined").await?;
    assert_eq!(declined["receiver_id"], 22);

    sender
        .send_json(&json!({
            "type": "battle_invitation",
            "lobby_code": "INV001",
            "receiver_id": 21
        }))
        .await?;
    assert_eq!(sender.recv_type("error").await?["code"], "bad_request");

    sender.close().await?;
    receiver.close().await?;
    server.stop().await;
    Ok(())
}

#[actix_web::test]
async fn disconnect_announces_departure() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let realtime = state.realtime.clone();
    let server = start_test_server(state).await?;
    let url = server.ws_url();

    let mut stayer = WebSocketClient::connect_as(&url, 31).await?;
    let mut leaver = WebSocketClient::connect_as(&url, 32).await?;
    for (client, id) in [(&mut stayer, 31), (&mut leaver, 32)] {
        client
            .send_json(&json!({ "type": "join_lobby", "lobby_code": "BYE123" }))
            .await?;
        wait_for_lobby_member(realtime.presence(), id, "BYE123", WAIT).await?;
    }
    stayer.recv_type("player_joined_lobby").await?;

    leaver.close().await?;
    let left = stayer.recv_type("player_left_lobby").await?;
    assert_eq!(left["user_id"], 32);
    assert_eq!(left["lobby_code"], "BYE123");

    stayer.close().await?;
    server.stop().await;
    Ok(())
}
