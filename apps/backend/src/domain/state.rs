use std::fmt;

use tokio::time::Instant;

use crate::domain::seat::PlayerId;
use crate::protocol::game_state::SeatSummary;

/// Session phases. `Stopped` is both the initial and the terminal state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    /// Not running; waiting for the host to start.
    Stopped,
    /// Judge picks (or times out picking) a prompt card.
    AwaitingPrompt,
    /// Every other connected seat submits answer cards.
    AwaitingAnswers,
    /// Judge chooses the winning submission, then the winner is displayed.
    AwaitingJudgment,
}

impl Phase {
    pub fn is_running(&self) -> bool {
        !matches!(self, Phase::Stopped)
    }
}

/// Handle for one scheduled timeout. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// One seat's answer cards for the current prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Captured at submission time so a seat removed mid-round can still be
    /// named as winner.
    pub seat: SeatSummary,
    pub cards: Vec<String>,
}

/// Everything that lives for exactly one round.
#[derive(Debug, Clone)]
pub struct RoundState {
    /// Current judge while running; the previous judge between rounds.
    pub judge: Option<PlayerId>,
    pub prompt: Option<String>,
    /// Answer cards each submission must contain.
    pub blanks: usize,
    /// Seats that still owe a submission, in roster order.
    pub pending: Vec<PlayerId>,
    /// Submissions in arrival order; shuffled on entering judgment.
    pub submissions: Vec<Submission>,
    /// Set once the current phase's single resolution has run.
    pub resolved: bool,
    /// When the displayed phase timer runs out.
    pub deadline: Option<Instant>,
}

impl RoundState {
    pub fn empty() -> Self {
        Self {
            judge: None,
            prompt: None,
            blanks: 0,
            pending: Vec::new(),
            submissions: Vec::new(),
            resolved: false,
            deadline: None,
        }
    }

    /// Drop everything but the judge pointer, which drives rotation.
    pub fn reset_keeping_judge(&mut self) {
        let judge = self.judge.take();
        *self = Self::empty();
        self.judge = judge;
    }

    pub fn is_judge(&self, id: &PlayerId) -> bool {
        self.judge.as_ref() == Some(id)
    }

    pub fn is_pending(&self, id: &PlayerId) -> bool {
        self.pending.iter().any(|p| p == id)
    }

    /// Remove `id` from the pending set; `true` if it was there.
    pub fn settle(&mut self, id: &PlayerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p != id);
        self.pending.len() != before
    }

    /// Whole seconds until the deadline, rounded up.
    pub fn seconds_left(&self, now: Instant) -> Option<u64> {
        self.deadline.map(|deadline| {
            let left = deadline.saturating_duration_since(now);
            let secs = left.as_secs();
            if left.subsec_nanos() > 0 {
                secs + 1
            } else {
                secs
            }
        })
    }
}
