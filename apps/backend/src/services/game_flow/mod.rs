//! Session coordinator: one game's roster, deck and round state machine.
//!
//! [`Game`] is synchronous and owns all of its state. Every mutation goes
//! through its methods, which the session runner calls one command at a
//! time, so a phase's action and its timeout can never interleave. The
//! methods are split by concern:
//!
//! - `seats`: joining, leaving, kicking, disconnects, host succession
//! - `round_lifecycle`: start/stop and the prompt → answers → judgment loop
//! - `player_actions`: command dispatch for the runner
//! - `orchestration`: the tokio task that drives a `Game`

mod orchestration;
mod player_actions;
mod round_lifecycle;
mod seats;
mod timers;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests_seats;

use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;

pub use orchestration::{spawn_game, GameHandle};
pub use player_actions::{GameCommand, PlayerAction};
pub use timers::{TimerBook, TimerKind, TimerRequest};

use crate::config::game::GameConfig;
use crate::domain::cards::{CardKind, Deck, DeckTemplate};
use crate::domain::roster::Roster;
use crate::domain::seat::{PlayerId, Seat};
use crate::domain::state::{Phase, RoundState, TimerId};
use crate::errors::domain::DomainError;
use crate::protocol::game_state::{GameSummary, StateSnapshot};
use crate::protocol::messages::ServerMsg;

pub struct Game {
    id: String,
    config: Arc<GameConfig>,
    template: Arc<DeckTemplate>,
    deck: Deck,
    roster: Roster,
    host: PlayerId,
    private: bool,
    phase: Phase,
    round: RoundState,
    timers: TimerBook,
    rng: StdRng,
    closed: bool,
    published: Arc<RwLock<GameSummary>>,
}

impl Game {
    /// New stopped session. `host` is seated by the following `add_player`.
    ///
    /// Sessions start private, so they only show up in listings once the
    /// host opens them.
    pub fn new(
        id: impl Into<String>,
        template: Arc<DeckTemplate>,
        host: PlayerId,
        config: Arc<GameConfig>,
    ) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let deck = template.clone_and_shuffle(&mut rng);
        let id = id.into();
        let published = Arc::new(RwLock::new(GameSummary {
            id: Some(id.clone()),
            language: template.language().to_string(),
            host: None,
            private: true,
            running: false,
            players: 0,
        }));

        Self {
            id,
            roster: Roster::new(config.max_players),
            config,
            template,
            deck,
            host,
            private: true,
            phase: Phase::Stopped,
            round: RoundState::empty(),
            timers: TimerBook::new(),
            rng,
            closed: false,
            published,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn language(&self) -> &str {
        self.template.language()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Set once no connected seat is left; the directory then drops the session.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn seat(&self, id: &PlayerId) -> Option<&Seat> {
        self.roster.get(id)
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn judge(&self) -> Option<&PlayerId> {
        if self.is_running() {
            self.round.judge.as_ref()
        } else {
            None
        }
    }

    pub fn deck_remaining(&self, kind: CardKind) -> usize {
        self.deck.remaining(kind)
    }

    pub fn timers(&self) -> &TimerBook {
        &self.timers
    }

    /// Drain scheduling instructions produced since the last call.
    pub fn take_timer_requests(&mut self) -> Vec<TimerRequest> {
        self.timers.take_requests()
    }

    /// Armed timer of `kind`, for tests and diagnostics.
    pub fn armed_timer(&self, kind: &TimerKind) -> Option<TimerId> {
        self.timers.armed_id(kind)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        if !self.is_running() {
            return StateSnapshot::stopped();
        }
        let judge = self
            .round
            .judge
            .as_ref()
            .and_then(|id| self.roster.get(id))
            .map(Seat::summary);
        let pending_answers = match self.phase {
            Phase::AwaitingJudgment => Some(
                self.round
                    .submissions
                    .iter()
                    .map(|s| s.cards.clone())
                    .collect(),
            ),
            _ => None,
        };
        StateSnapshot {
            running: true,
            judge,
            prompt: self.round.prompt.clone(),
            pending_answers,
            timer: self.round.seconds_left(Instant::now()),
        }
    }

    /// Listing entry including the id, as members see it.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            id: Some(self.id.clone()),
            language: self.language().to_string(),
            host: self.roster.get(&self.host).map(Seat::summary),
            private: self.private,
            running: self.is_running(),
            players: self.roster.connected_count(),
        }
    }

    /// Read-only view the directory lists from.
    pub fn shared_summary(&self) -> Arc<RwLock<GameSummary>> {
        Arc::clone(&self.published)
    }

    fn publish(&self) {
        *self.published.write() = self.summary();
    }

    fn broadcast(&self, msg: ServerMsg) {
        self.roster.broadcast(&msg);
    }

    fn broadcast_state(&self) {
        self.broadcast(ServerMsg::State {
            state: self.snapshot(),
        });
    }

    fn send_to(&self, id: &PlayerId, msg: ServerMsg) {
        if let Some(seat) = self.roster.get(id) {
            seat.send(msg);
        }
    }

    fn require_host(&self, by: &PlayerId, action: &str) -> Result<(), DomainError> {
        if by == &self.host {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "{by} is not the host and cannot {action}"
            )))
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.timers.disarm_all();
        self.phase = Phase::Stopped;
        self.closed = true;
        tracing::info!(game_id = %self.id, "[GAME] no connected seats left; closing");
    }
}
