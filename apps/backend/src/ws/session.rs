use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::app_state::AppState;
use crate::ws::hub::Deliver;
use crate::ws::protocol::{ClientMsg, ErrorCode, Room, ServerMsg, PROTOCOL_VERSION};
use crate::ws::Realtime;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// GET /ws
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), app_state.realtime.clone());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    realtime: Arc<Realtime>,
    user_id: Option<i64>,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(conn_id: Uuid, realtime: Arc<Realtime>) -> Self {
        Self {
            conn_id,
            realtime,
            user_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error(ctx: &mut ws::WebsocketContext<Self>, code: ErrorCode, message: impl Into<String>) {
        Self::send_json(
            ctx,
            &ServerMsg::Error {
                code,
                message: message.into(),
            },
        );
    }

    fn send_error_and_close(
        ctx: &mut ws::WebsocketContext<Self>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        Self::send_error(ctx, code, message);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    conn_id = %actor.conn_id,
                    user_id = ?actor.user_id,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    /// Publish from this socket, skipping it on delivery.
    fn relay(&self, room: Room, event: ServerMsg) {
        let realtime = self.realtime.clone();
        let conn_id = self.conn_id;
        actix::spawn(async move {
            realtime.publish_except(room, event, Some(conn_id)).await;
        });
    }

    fn publish(&self, room: Room, event: ServerMsg) {
        let realtime = self.realtime.clone();
        actix::spawn(async move {
            realtime.publish(room, event).await;
        });
    }

    fn handle_client(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        if let ClientMsg::Setup { user_id } = cmd {
            let presence = self.realtime.presence();
            presence.bind_user(self.conn_id, user_id);
            self.user_id = Some(user_id);
            debug!(conn_id = %self.conn_id, user_id, "[WS SESSION] setup");
            Self::send_json(
                ctx,
                &ServerMsg::SetupAck {
                    user_id,
                    in_game: presence.in_game(user_id),
                },
            );
            return;
        }

        let Some(user_id) = self.user_id else {
            Self::send_error_and_close(ctx, ErrorCode::SetupRequired, "Must send setup first");
            return;
        };

        match cmd {
            ClientMsg::Setup { .. } => {}

            ClientMsg::JoinLobby { lobby_code, player } => {
                let code = lobby_code.to_ascii_uppercase();
                let room = Room::lobby(code.clone());
                self.realtime.presence().join_lobby(self.conn_id, &code);
                let event = ServerMsg::PlayerJoinedLobby {
                    lobby_code: code,
                    user_id,
                    player,
                };
                self.relay(room, event);
            }

            ClientMsg::LeaveLobby { lobby_code } => {
                let code = lobby_code.to_ascii_uppercase();
                let room = Room::lobby(code.clone());
                self.realtime.presence().leave_lobby(self.conn_id, &code);
                let event = ServerMsg::PlayerLeftLobby {
                    lobby_code: code,
                    user_id,
                };
                self.publish(room, event);
            }

            ClientMsg::BattleInvitation {
                lobby_code,
                receiver_id,
                payload,
            } => {
                if receiver_id == user_id {
                    Self::send_error(ctx, ErrorCode::BadRequest, "Cannot invite yourself");
                    return;
                }
                let lobby_code = lobby_code.to_ascii_uppercase();
                self.publish(
                    Room::user(receiver_id),
                    ServerMsg::BattleInvitation {
                        lobby_code: lobby_code.clone(),
                        sender_id: user_id,
                        receiver_id,
                        payload,
                    },
                );
                Self::send_json(
                    ctx,
                    &ServerMsg::BattleInvitationSent {
                        lobby_code,
                        sender_id: user_id,
                        receiver_id,
                    },
                );
            }

            ClientMsg::AcceptBattleInvitation {
                lobby_code,
                sender_id,
            } => {
                self.publish(
                    Room::user(sender_id),
                    ServerMsg::BattleInvitationAccepted {
                        lobby_code: lobby_code.to_ascii_uppercase(),
                        sender_id,
                        receiver_id: user_id,
                    },
                );
            }

            ClientMsg::DeclineBattleInvitation {
                lobby_code,
                sender_id,
            } => {
                self.publish(
                    Room::user(sender_id),
                    ServerMsg::BattleInvitationDeclined {
                        lobby_code: lobby_code.to_ascii_uppercase(),
                        sender_id,
                        receiver_id: user_id,
                    },
                );
            }

            ClientMsg::PlayerReadyStateChanged {
                lobby_code,
                is_ready,
            } => {
                let code = lobby_code.to_ascii_uppercase();
                let room = Room::lobby(code.clone());
                let event = ServerMsg::PlayerReadyStateChanged {
                    lobby_code: code,
                    user_id,
                    is_ready,
                };
                self.relay(room, event);
            }

            ClientMsg::QuestionTypesChanged {
                lobby_code,
                question_types,
            } => {
                let code = lobby_code.to_ascii_uppercase();
                let room = Room::lobby(code.clone());
                let event = ServerMsg::QuestionTypesChanged {
                    lobby_code: code,
                    user_id,
                    question_types,
                };
                self.relay(room, event);
            }

            ClientMsg::StudyMaterialChanged {
                lobby_code,
                study_material_id,
                study_material_title,
            } => {
                let code = lobby_code.to_ascii_uppercase();
                let room = Room::lobby(code.clone());
                let event = ServerMsg::StudyMaterialChanged {
                    lobby_code: code,
                    user_id,
                    study_material_id,
                    study_material_title,
                };
                self.relay(room, event);
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.realtime
            .presence()
            .register(self.conn_id, ctx.address().recipient::<Deliver>());
        self.start_heartbeat(ctx);
        Self::send_json(
            ctx,
            &ServerMsg::Connected {
                connection_id: self.conn_id,
                protocol: PROTOCOL_VERSION,
            },
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let departure = self.realtime.presence().unregister(self.conn_id);
        info!(
            conn_id = %self.conn_id,
            user_id = ?departure.user_id,
            lobbies = departure.lobbies.len(),
            "[WS SESSION] stopped"
        );
        let Some(user_id) = departure.user_id else {
            return;
        };
        for lobby_code in departure.lobbies {
            self.publish(
                Room::lobby(lobby_code.clone()),
                ServerMsg::PlayerLeftLobby {
                    lobby_code,
                    user_id,
                },
            );
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(cmd) => self.handle_client(cmd, ctx),
                    Err(err) => {
                        debug!(conn_id = %self.conn_id, error = %err, "[WS SESSION] malformed message");
                        Self::send_error(ctx, ErrorCode::BadRequest, "Malformed message");
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<Deliver> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(ctx, &msg.0);
    }
}
