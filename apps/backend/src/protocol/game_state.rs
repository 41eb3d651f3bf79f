use serde::{Deserialize, Serialize};

use crate::domain::seat::PlayerId;

/// Public view of one seat, used by roster events and snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub connected: bool,
}

/// Full phase snapshot, sent on join/reconnect and every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub running: bool,
    pub judge: Option<SeatSummary>,
    pub prompt: Option<String>,
    /// Anonymous, shuffled submissions; only present while judging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_answers: Option<Vec<Vec<String>>>,
    /// Whole seconds left on the running phase timer.
    pub timer: Option<u64>,
}

impl StateSnapshot {
    pub fn stopped() -> Self {
        Self {
            running: false,
            judge: None,
            prompt: None,
            pending_answers: None,
            timer: None,
        }
    }
}

/// Read-only listing entry a session publishes for the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// `None` in public listings of private games.
    pub id: Option<String>,
    pub language: String,
    pub host: Option<SeatSummary>,
    pub private: bool,
    pub running: bool,
    /// Connected seat count.
    pub players: usize,
}

impl GameSummary {
    /// Copy suitable for someone who is not a member.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        if out.private {
            out.id = None;
        }
        out
    }
}

/// Card pack summary advertised in the greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub lang: String,
    pub name: String,
    pub prompts: usize,
    pub answers: usize,
}
