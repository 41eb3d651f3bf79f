use serde::{Deserialize, Serialize};

use crate::domain::seat::PlayerId;
pub use crate::protocol::game_state::{GameSummary, LanguageInfo, SeatSummary, StateSnapshot};

pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder seat requested by an `invite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitee {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Login { id: String, name: String },
    List,
    Create { language: String },
    Join { game_id: String },
    Start,
    Stop,
    Pick,
    Select { cards: Vec<String> },
    /// Signed so that a negative index parses and falls back to random.
    Winner {
        #[serde(default)]
        index: Option<i64>,
    },
    Kick { player_id: String },
    Leave,
    Chat { message: String },
    Private,
    Invite { friends: Vec<Invitee> },
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    Hello {
        version: String,
        languages: Vec<LanguageInfo>,
    },

    LoggedIn {
        id: PlayerId,
        name: String,
    },

    Games {
        games: Vec<GameSummary>,
    },

    Created {
        game: GameSummary,
    },

    Joined {
        game: GameSummary,
    },

    JoinFailed {
        reason: JoinFailure,
    },

    Join {
        seat: SeatSummary,
    },

    Left {
        seat: SeatSummary,
    },

    Update {
        seat: SeatSummary,
    },

    State {
        state: StateSnapshot,
    },

    /// Hand delta for one seat. `clear` drops every held card first.
    Cards {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        clear: bool,
        #[serde(default)]
        add: Vec<String>,
        #[serde(default)]
        del: Vec<String>,
    },

    Nudge {
        action: NudgeAction,
    },

    Winner {
        seat: SeatSummary,
        cards: Vec<String>,
        index: usize,
    },

    #[serde(rename = "newhost")]
    NewHost {
        seat: SeatSummary,
    },

    Stopped {
        reason: Option<StopReason>,
    },

    Chat {
        seat: SeatSummary,
        message: String,
    },

    GameUpdate {
        game: GameSummary,
    },

    MeLeft,

    Error {
        code: ErrorCode,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinFailure {
    Full,
    #[serde(rename = "notfound")]
    NotFound,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeAction {
    Pick,
    Select,
    Evaluate,
}

/// Why a running game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    #[serde(rename = "host-stop")]
    HostStop,
    #[serde(rename = "understaffed")]
    Understaffed,
    #[serde(rename = "outofcards")]
    OutOfCards,
    #[serde(rename = "internal")]
    Internal,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::HostStop => "host-stop",
            StopReason::Understaffed => "understaffed",
            StopReason::OutOfCards => "outofcards",
            StopReason::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    NotLoggedIn,
    AlreadyInGame,
    NotInGame,
    UnknownLanguage,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::NotLoggedIn => "not_logged_in",
            ErrorCode::AlreadyInGame => "already_in_game",
            ErrorCode::NotInGame => "not_in_game",
            ErrorCode::UnknownLanguage => "unknown_language",
        }
    }
}
