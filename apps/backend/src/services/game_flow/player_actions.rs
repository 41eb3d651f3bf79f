//! Command dispatch: the single entry point the session runner calls.
//!
//! Every failure is absorbed and logged here; nothing escapes a running
//! game.

use tracing::{debug, error, warn};
use uuid::Uuid;

use super::Game;
use crate::domain::seat::{Connection, Identity, PlayerId};
use crate::domain::state::TimerId;
use crate::errors::domain::DomainError;
use crate::protocol::messages::{ClientMsg, Invitee};

/// In-game request from a seated participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Start,
    Stop,
    Pick,
    Select(Vec<String>),
    Winner(Option<i64>),
    Kick(String),
    Leave,
    Chat(String),
    Private,
    Invite(Vec<Invitee>),
}

impl PlayerAction {
    /// The in-game subset of client messages; lobby messages yield `None`.
    pub fn from_client(msg: ClientMsg) -> Option<Self> {
        Some(match msg {
            ClientMsg::Start => Self::Start,
            ClientMsg::Stop => Self::Stop,
            ClientMsg::Pick => Self::Pick,
            ClientMsg::Select { cards } => Self::Select(cards),
            ClientMsg::Winner { index } => Self::Winner(index),
            ClientMsg::Kick { player_id } => Self::Kick(player_id),
            ClientMsg::Leave => Self::Leave,
            ClientMsg::Chat { message } => Self::Chat(message),
            ClientMsg::Private => Self::Private,
            ClientMsg::Invite { friends } => Self::Invite(friends),
            ClientMsg::Login { .. }
            | ClientMsg::List
            | ClientMsg::Create { .. }
            | ClientMsg::Join { .. } => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pick => "pick",
            Self::Select(_) => "select",
            Self::Winner(_) => "winner",
            Self::Kick(_) => "kick",
            Self::Leave => "leave",
            Self::Chat(_) => "chat",
            Self::Private => "private",
            Self::Invite(_) => "invite",
        }
    }
}

#[derive(Debug)]
pub enum GameCommand {
    Join {
        identity: Identity,
        connection: Connection,
        created: bool,
    },
    Action {
        player: PlayerId,
        connection_id: Uuid,
        action: PlayerAction,
    },
    Disconnect {
        player: PlayerId,
        connection_id: Uuid,
    },
    Timeout(TimerId),
}

impl Game {
    pub fn handle(&mut self, cmd: GameCommand) {
        let (context, player, result) = match cmd {
            GameCommand::Join {
                identity,
                connection,
                created,
            } => {
                let player = identity.id.clone();
                ("join", Some(player), self.add_player(identity, connection, created))
            }
            GameCommand::Action {
                player,
                connection_id,
                action,
            } => {
                let context = action.name();
                let result = self.act_from(&player, connection_id, action);
                (context, Some(player), result)
            }
            GameCommand::Disconnect {
                player,
                connection_id,
            } => {
                let result = self.disconnect(&player, connection_id);
                ("disconnect", Some(player), result)
            }
            GameCommand::Timeout(id) => {
                self.on_timeout(id);
                ("timeout", None, Ok(()))
            }
        };

        if let Err(err) = result {
            self.log_absorbed(context, player.as_ref(), &err);
        }
    }

    /// Apply an action only if it comes through the seat's live connection.
    fn act_from(
        &mut self,
        player: &PlayerId,
        connection_id: Uuid,
        action: PlayerAction,
    ) -> Result<(), DomainError> {
        let current = self.roster.get(player).and_then(|s| s.connection_id());
        if current != Some(connection_id) {
            return Err(DomainError::forbidden(format!(
                "{player} acted through a connection that no longer holds the seat"
            )));
        }
        self.act(player, action)
    }

    /// Apply an action on behalf of `player`.
    pub fn act(&mut self, player: &PlayerId, action: PlayerAction) -> Result<(), DomainError> {
        match action {
            PlayerAction::Start => self.start(player),
            PlayerAction::Stop => self.stop_by(player),
            PlayerAction::Pick => self.pick(player),
            PlayerAction::Select(cards) => self.select(player, cards),
            PlayerAction::Winner(index) => self.choose_winner(player, index),
            PlayerAction::Kick(target) => {
                let target = PlayerId::parse(&target)?;
                self.kick(player, &target)
            }
            PlayerAction::Leave => self.leave(player),
            PlayerAction::Chat(message) => self.chat(player, message),
            PlayerAction::Private => self.toggle_private(player),
            PlayerAction::Invite(friends) => self.invite(player, friends).map(|_| ()),
        }
    }

    fn log_absorbed(&self, context: &str, player: Option<&PlayerId>, err: &DomainError) {
        let player = player.map(PlayerId::as_str).unwrap_or("-");
        match err {
            DomainError::Internal(_) => {
                error!(game_id = %self.id, player_id = player, action = context, error = %err, "[GAME] invariant violated")
            }
            DomainError::Conflict(..) => {
                debug!(game_id = %self.id, player_id = player, action = context, error = %err, "[GAME] action ignored")
            }
            _ => {
                warn!(game_id = %self.id, player_id = player, action = context, error = %err, "[GAME] action rejected")
            }
        }
    }
}
