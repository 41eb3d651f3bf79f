use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::seat::{Connection, Identity};
use crate::protocol::messages::{ClientMsg, ErrorCode, JoinFailure, ServerMsg, PROTOCOL_VERSION};
use crate::services::game_flow::{GameCommand, GameHandle, PlayerAction};
use crate::state::app_state::AppState;
use crate::utils::session_id::is_valid_session_id;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    ws::start(WsSession::new(app_state), &req, stream)
}

/// One WebSocket connection.
///
/// Lobby messages (login, list, create, join) are handled here; in-game
/// messages are forwarded to the game task. Everything the game sends to
/// this seat arrives on `connection`'s receiving half and is written to the
/// socket in order.
pub struct WsSession {
    connection: Connection,
    outbound: Option<UnboundedReceiver<ServerMsg>>,
    app_state: web::Data<AppState>,
    identity: Option<Identity>,

    /// Game asked to seat us, not yet acknowledged.
    pending: Option<GameHandle>,
    /// Game we are seated in.
    game: Option<GameHandle>,

    last_heartbeat: Instant,
}

impl WsSession {
    fn new(app_state: web::Data<AppState>) -> Self {
        let (connection, outbound) = Connection::channel();
        Self {
            connection,
            outbound: Some(outbound),
            app_state,
            identity: None,
            pending: None,
            game: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn conn_id(&self) -> Uuid {
        self.connection.id()
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
        &self,
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
                warn!(conn_id = %actor.conn_id(), "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }

    /// The game this connection is seated in or about to be.
    fn membership(&self) -> Option<&GameHandle> {
        self.game.as_ref().or(self.pending.as_ref())
    }

    fn handle_client(&mut self, msg: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMsg::Login { id, name } => self.login(&id, &name, ctx),
            ClientMsg::List => {
                let games = self.app_state.registry.list_public();
                Self::send_json(ctx, &ServerMsg::Games { games });
            }
            ClientMsg::Create { language } => self.create(&language, ctx),
            ClientMsg::Join { game_id } => self.join(&game_id, ctx),
            other => {
                let Some(action) = PlayerAction::from_client(other) else {
                    return;
                };
                self.forward(action, ctx);
            }
        }
    }

    fn login(&mut self, id: &str, name: &str, ctx: &mut ws::WebsocketContext<Self>) {
        if self.membership().is_some() {
            Self::send_error(ctx, ErrorCode::AlreadyInGame, "cannot change identity inside a game");
            return;
        }
        match Identity::new(id, name) {
            Ok(identity) => {
                info!(conn_id = %self.conn_id(), player_id = %identity.id, "[WS SESSION] logged in");
                Self::send_json(
                    ctx,
                    &ServerMsg::LoggedIn {
                        id: identity.id.clone(),
                        name: identity.name.clone(),
                    },
                );
                self.identity = Some(identity);
            }
            Err(err) => Self::send_error(ctx, ErrorCode::BadRequest, err.to_string()),
        }
    }

    /// Identity of a logged-in connection that is not in a game yet.
    fn lobby_identity(&self, ctx: &mut ws::WebsocketContext<Self>) -> Option<Identity> {
        let Some(identity) = self.identity.clone() else {
            Self::send_error(ctx, ErrorCode::NotLoggedIn, "log in first");
            return None;
        };
        if self.membership().is_some() {
            Self::send_error(ctx, ErrorCode::AlreadyInGame, "leave the current game first");
            return None;
        }
        Some(identity)
    }

    fn create(&mut self, language: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(identity) = self.lobby_identity(ctx) else {
            return;
        };
        match self
            .app_state
            .registry
            .create(language, identity, self.connection.clone())
        {
            Ok(handle) => self.pending = Some(handle),
            Err(err) if err.code() == "LANGUAGE_NOT_FOUND" => {
                Self::send_error(ctx, ErrorCode::UnknownLanguage, err.detail());
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id(), error = %err, "[WS SESSION] create failed");
                Self::send_error(ctx, ErrorCode::BadRequest, err.detail());
            }
        }
    }

    fn join(&mut self, game_id: &str, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(identity) = self.lobby_identity(ctx) else {
            return;
        };
        let failed = |ctx: &mut ws::WebsocketContext<Self>, reason| {
            Self::send_json(ctx, &ServerMsg::JoinFailed { reason });
        };
        if !is_valid_session_id(game_id) {
            failed(ctx, JoinFailure::Invalid);
            return;
        }
        let Some(handle) = self.app_state.registry.get(game_id) else {
            failed(ctx, JoinFailure::NotFound);
            return;
        };
        let sent = handle.send(GameCommand::Join {
            identity,
            connection: self.connection.clone(),
            created: false,
        });
        if sent {
            self.pending = Some(handle);
        } else {
            failed(ctx, JoinFailure::NotFound);
        }
    }

    fn forward(&mut self, action: PlayerAction, ctx: &mut ws::WebsocketContext<Self>) {
        let (Some(identity), Some(game)) = (&self.identity, &self.game) else {
            Self::send_error(ctx, ErrorCode::NotInGame, format!("{} needs a game", action.name()));
            return;
        };
        let sent = game.send(GameCommand::Action {
            player: identity.id.clone(),
            connection_id: self.conn_id(),
            action,
        });
        if !sent {
            self.game = None;
            Self::send_error(ctx, ErrorCode::NotInGame, "the game has ended");
        }
    }

    /// Keep membership in step with what the game told us.
    fn track(&mut self, msg: &ServerMsg) {
        match msg {
            ServerMsg::Created { .. } | ServerMsg::Joined { .. } => {
                if let Some(handle) = self.pending.take() {
                    self.game = Some(handle);
                }
            }
            ServerMsg::JoinFailed { .. } => self.pending = None,
            ServerMsg::MeLeft => self.game = None,
            _ => {}
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id(), "[WS SESSION] started");

        if let Some(outbound) = self.outbound.take() {
            ctx.add_stream(UnboundedReceiverStream::new(outbound));
        }
        Self::send_json(
            ctx,
            &ServerMsg::Hello {
                version: PROTOCOL_VERSION.to_string(),
                languages: self.app_state.packs.languages(),
            },
        );
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let (Some(identity), Some(game)) = (&self.identity, self.membership()) {
            game.send(GameCommand::Disconnect {
                player: identity.id.clone(),
                connection_id: self.connection.id(),
            });
        }
        info!(conn_id = %self.conn_id(), "[WS SESSION] stopped");
    }
}

/// Messages the game addressed to this seat.
impl StreamHandler<ServerMsg> for WsSession {
    fn handle(&mut self, msg: ServerMsg, ctx: &mut Self::Context) {
        self.track(&msg);
        Self::send_json(ctx, &msg);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The session holds a sender itself, so this only happens on teardown.
        debug!(conn_id = %self.conn_id(), "[WS SESSION] outbound stream ended");
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

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(cmd) = parsed else {
                    self.send_error_and_close(ctx, ErrorCode::BadRequest, "Malformed JSON");
                    return;
                };
                self.handle_client(cmd, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
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
                    conn_id = %self.conn_id(),
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
