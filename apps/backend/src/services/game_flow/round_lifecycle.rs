use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::timers::TimerKind;
use super::Game;
use crate::domain::cards::{count_blanks, pick_index, shuffle};
use crate::domain::seat::PlayerId;
use crate::domain::state::{Phase, RoundState, Submission, TimerId};
use crate::errors::domain::{ConflictKind, DomainError, ExhaustedKind};
use crate::protocol::messages::{NudgeAction, ServerMsg, StopReason};

impl Game {
    /// Host starts a stopped game.
    ///
    /// Needs at least `min_players` connected seats. An exhausted deck is
    /// re-cloned from the template and every hand is discarded first.
    pub fn start(&mut self, by: &PlayerId) -> Result<(), DomainError> {
        self.require_host(by, "start")?;
        if self.is_running() {
            return Err(DomainError::conflict(
                ConflictKind::AlreadyRunning,
                "game is already running",
            ));
        }
        let connected = self.roster.connected_count();
        if connected < self.config.min_players {
            return Err(DomainError::validation(format!(
                "{connected} connected players, at least {} required",
                self.config.min_players
            )));
        }

        if !self.deck.is_playable() {
            self.deck = self.template.clone_and_shuffle(&mut self.rng);
            for seat in self.roster.iter_mut() {
                seat.clear_hand();
                seat.send(ServerMsg::Cards {
                    clear: true,
                    add: Vec::new(),
                    del: Vec::new(),
                });
            }
            info!(game_id = %self.id, "[GAME] deck re-initialised from template");
            if !self.deck.is_playable() {
                return Err(DomainError::exhausted(
                    ExhaustedKind::Prompts,
                    format!("template {} has no playable cards", self.template.language()),
                ));
            }
        }

        self.round = RoundState::empty();
        self.phase = Phase::AwaitingPrompt;
        info!(game_id = %self.id, players = connected, "[GAME] started");
        self.broadcast_state();
        self.next_round();
        self.publish();
        Ok(())
    }

    /// Host stops a running game.
    pub fn stop_by(&mut self, by: &PlayerId) -> Result<(), DomainError> {
        self.require_host(by, "stop")?;
        if !self.is_running() {
            return Err(DomainError::conflict(
                ConflictKind::NotRunning,
                "game is not running",
            ));
        }
        self.stop(StopReason::HostStop);
        Ok(())
    }

    /// Enter `Stopped`, cancelling every outstanding timer first.
    pub(super) fn stop(&mut self, reason: StopReason) {
        if !self.is_running() {
            return;
        }
        self.timers.disarm_all();
        self.phase = Phase::Stopped;
        self.round.reset_keeping_judge();
        info!(game_id = %self.id, reason = reason.as_str(), "[GAME] stopped");
        self.broadcast(ServerMsg::Stopped {
            reason: Some(reason),
        });
        self.publish();
    }

    /// Rotate the judge, top up hands and open the prompt phase.
    pub(super) fn next_round(&mut self) {
        if !self.is_running() {
            return;
        }
        self.timers.disarm_all();
        self.round.reset_keeping_judge();

        let previous = self.round.judge.take();
        let Some(judge) = self.roster.next_connected_after(previous.as_ref()).cloned() else {
            error!(game_id = %self.id, "[GAME] no connected seat can judge");
            self.stop(StopReason::Internal);
            return;
        };
        self.round.judge = Some(judge.clone());

        if let Err(err) = self.top_up_hands() {
            warn!(game_id = %self.id, error = %err, "[GAME] cannot fill hands");
            self.stop(StopReason::OutOfCards);
            return;
        }

        self.phase = Phase::AwaitingPrompt;
        self.round.deadline = Some(Instant::now() + self.config.pick_timeout);
        info!(game_id = %self.id, judge = %judge, "[GAME] next round");
        self.broadcast_state();
        self.send_to(
            &judge,
            ServerMsg::Nudge {
                action: NudgeAction::Pick,
            },
        );
        self.timers.arm(TimerKind::Pick, self.config.pick_timeout);
    }

    /// Deal answer cards until every connected hand is full.
    fn top_up_hands(&mut self) -> Result<(), DomainError> {
        let hand_size = self.config.hand_size;
        let mut dealt = 0usize;
        let mut short = false;

        for seat in self.roster.iter_mut().filter(|s| s.is_connected()) {
            let mut added = Vec::new();
            while seat.hand().len() < hand_size {
                let Some(card) = self.deck.draw_answer(&mut self.rng) else {
                    short = true;
                    break;
                };
                seat.add_card(card.clone());
                added.push(card);
            }
            dealt += added.len();
            if !added.is_empty() {
                seat.send(ServerMsg::Cards {
                    clear: false,
                    add: added,
                    del: Vec::new(),
                });
            }
        }

        if dealt > 0 {
            debug!(game_id = %self.id, dealt, "[GAME] hands topped up");
        }
        if short {
            return Err(DomainError::exhausted(
                ExhaustedKind::Answers,
                "answer pool ran dry while dealing",
            ));
        }
        Ok(())
    }

    /// Judge resolves the prompt phase early.
    pub fn pick(&mut self, by: &PlayerId) -> Result<(), DomainError> {
        self.require_phase(Phase::AwaitingPrompt, "pick")?;
        self.require_judge(by, "pick")?;
        self.require_unresolved("pick")?;
        self.timers.disarm_kind(&TimerKind::Pick);
        self.resolve_pick(false);
        Ok(())
    }

    fn resolve_pick(&mut self, after_timeout: bool) {
        self.round.resolved = true;
        let Some(prompt) = self.deck.draw_prompt(&mut self.rng) else {
            info!(game_id = %self.id, "[GAME] out of prompt cards");
            self.stop(StopReason::OutOfCards);
            return;
        };
        info!(game_id = %self.id, prompt = %prompt, after_timeout, "[GAME] prompt picked");
        self.enter_answers(prompt);
    }

    fn enter_answers(&mut self, prompt: String) {
        let judge = self.round.judge.clone();
        self.phase = Phase::AwaitingAnswers;
        self.round.resolved = false;
        self.round.blanks = count_blanks(&prompt);
        self.round.prompt = Some(prompt);
        self.round.submissions.clear();
        self.round.pending = self
            .roster
            .iter()
            .filter(|s| s.is_connected() && Some(s.id()) != judge.as_ref())
            .map(|s| s.id().clone())
            .collect();
        self.round.deadline = Some(Instant::now() + self.config.select_timeout);
        self.broadcast_state();

        let window = self.config.select_window();
        for id in self.round.pending.clone() {
            self.send_to(
                &id,
                ServerMsg::Nudge {
                    action: NudgeAction::Select,
                },
            );
            self.timers.arm(TimerKind::Select(id), window);
        }

        if self.round.pending.is_empty() {
            self.enter_judgment();
        }
    }

    /// A seat submits its answer cards.
    ///
    /// Only a list of exactly the required length is considered; cards the
    /// seat does not hold are replaced by random cards from its own hand.
    pub fn select(&mut self, by: &PlayerId, cards: Vec<String>) -> Result<(), DomainError> {
        self.require_phase(Phase::AwaitingAnswers, "select")?;
        if !self.round.is_pending(by) {
            return Err(DomainError::conflict(
                ConflictKind::PhaseResolved,
                format!("{by} owes no submission this round"),
            ));
        }
        self.timers.disarm_kind(&TimerKind::Select(by.clone()));
        self.resolve_selection(by, Some(cards), false);
        Ok(())
    }

    pub(super) fn resolve_selection(
        &mut self,
        id: &PlayerId,
        requested: Option<Vec<String>>,
        after_timeout: bool,
    ) {
        if !self.submit_answer(id, requested, after_timeout, true) {
            return;
        }
        if self.round.pending.is_empty() {
            self.enter_judgment();
        }
    }

    /// Record `id`'s submission, filling gaps from its own hand.
    ///
    /// With `refill` the hand is topped up from the deck and the seat gets
    /// its card delta; a seat on its way out skips both. Returns `false`
    /// when `id` owed nothing.
    pub(super) fn submit_answer(
        &mut self,
        id: &PlayerId,
        requested: Option<Vec<String>>,
        after_timeout: bool,
        refill: bool,
    ) -> bool {
        if !self.round.settle(id) {
            return false;
        }
        let blanks = self.round.blanks;
        let hand_size = self.config.hand_size;

        if let Some(seat) = self.roster.get_mut(id) {
            let mut chosen = Vec::with_capacity(blanks);
            if let Some(requested) = requested.filter(|r| r.len() == blanks) {
                for card in &requested {
                    if let Some(card) = seat.take_card(card) {
                        chosen.push(card);
                    }
                }
            }
            while chosen.len() < blanks {
                let Some(index) = pick_index(seat.hand().len(), &mut self.rng) else {
                    break;
                };
                if let Some(card) = seat.take_card_at(index) {
                    chosen.push(card);
                }
            }

            let mut added = Vec::new();
            while seat.hand().len() < hand_size {
                let Some(card) = self.deck.draw_answer(&mut self.rng) else {
                    warn!(game_id = %self.id, player_id = %id, "[GAME] no answer cards left to refill");
                    break;
                };
                seat.add_card(card.clone());
                added.push(card);
            }

            info!(
                game_id = %self.id,
                player_id = %id,
                cards = ?chosen,
                after_timeout,
                "[GAME] answer submitted"
            );
            if refill {
                seat.send(ServerMsg::Cards {
                    clear: false,
                    add: added,
                    del: chosen.clone(),
                });
            }
            self.round.submissions.push(Submission {
                seat: seat.summary(),
                cards: chosen,
            });
        }
        true
    }

    pub(super) fn enter_judgment(&mut self) {
        if self.round.submissions.is_empty() {
            info!(game_id = %self.id, "[GAME] nothing to judge; next round");
            self.next_round();
            return;
        }
        let submissions = std::mem::take(&mut self.round.submissions);
        self.round.submissions = shuffle(submissions, &mut self.rng);
        self.phase = Phase::AwaitingJudgment;
        self.round.resolved = false;
        self.round.deadline = Some(Instant::now() + self.config.judgment_timeout);
        info!(
            game_id = %self.id,
            submissions = self.round.submissions.len(),
            "[GAME] judging"
        );
        self.broadcast_state();
        if let Some(judge) = self.round.judge.clone() {
            self.send_to(
                &judge,
                ServerMsg::Nudge {
                    action: NudgeAction::Evaluate,
                },
            );
        }
        self.timers
            .arm(TimerKind::Judgment, self.config.judgment_window());
    }

    /// Judge names the winning submission by its index in the shuffled list.
    ///
    /// A missing or out-of-range index is replaced by a random valid one.
    pub fn choose_winner(&mut self, by: &PlayerId, index: Option<i64>) -> Result<(), DomainError> {
        self.require_phase(Phase::AwaitingJudgment, "winner")?;
        self.require_judge(by, "winner")?;
        self.require_unresolved("winner")?;
        self.timers.disarm_kind(&TimerKind::Judgment);
        self.resolve_winner(index, false);
        Ok(())
    }

    fn resolve_winner(&mut self, index: Option<i64>, after_timeout: bool) {
        self.round.resolved = true;
        self.round.deadline = None;

        let count = self.round.submissions.len();
        let valid = index
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < count);
        let index = match valid {
            Some(i) => i,
            None => {
                let Some(i) = pick_index(count, &mut self.rng) else {
                    error!(game_id = %self.id, "[GAME] judging without submissions");
                    self.stop(StopReason::Internal);
                    return;
                };
                info!(game_id = %self.id, requested = ?index, chosen = i, "[GAME] no valid winner given; chose randomly");
                i
            }
        };

        let winner = self.round.submissions[index].clone();
        let seat = match self.roster.get_mut(&winner.seat.id) {
            Some(seat) => {
                seat.award_point();
                Some(seat.summary())
            }
            None => None,
        };
        info!(
            game_id = %self.id,
            winner = %winner.seat.id,
            index,
            after_timeout,
            "[GAME] round won"
        );
        self.broadcast(ServerMsg::Winner {
            seat: seat.clone().unwrap_or(winner.seat),
            cards: winner.cards,
            index,
        });
        if let Some(seat) = seat {
            self.broadcast(ServerMsg::Update { seat });
        }
        self.timers
            .arm(TimerKind::NextRound, self.config.winner_display);
    }

    /// A scheduled timer fired. Stale or cancelled timers are ignored.
    pub fn on_timeout(&mut self, id: TimerId) {
        let Some(kind) = self.timers.claim(id) else {
            debug!(game_id = %self.id, timer_id = %id, "[GAME] cancelled timer ignored");
            return;
        };
        debug!(game_id = %self.id, timer_id = %id, kind = ?kind, "[GAME] timer fired");

        match (kind, self.phase) {
            (TimerKind::Pick, Phase::AwaitingPrompt) if !self.round.resolved => {
                self.resolve_pick(true);
            }
            (TimerKind::Select(seat), Phase::AwaitingAnswers) => {
                self.resolve_selection(&seat, None, true);
            }
            (TimerKind::Judgment, Phase::AwaitingJudgment) if !self.round.resolved => {
                self.resolve_winner(None, true);
            }
            (TimerKind::NextRound, Phase::AwaitingJudgment) if self.round.resolved => {
                self.next_round();
            }
            (kind, phase) => {
                debug!(game_id = %self.id, kind = ?kind, phase = ?phase, "[GAME] timer no longer applies");
            }
        }
    }

    fn require_phase(&self, phase: Phase, action: &str) -> Result<(), DomainError> {
        if self.phase == phase {
            return Ok(());
        }
        let kind = if self.is_running() {
            ConflictKind::PhaseResolved
        } else {
            ConflictKind::NotRunning
        };
        Err(DomainError::conflict(
            kind,
            format!("cannot {action} during {:?}", self.phase),
        ))
    }

    fn require_judge(&self, by: &PlayerId, action: &str) -> Result<(), DomainError> {
        if self.round.is_judge(by) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "{by} is not the judge and cannot {action}"
            )))
        }
    }

    fn require_unresolved(&self, action: &str) -> Result<(), DomainError> {
        if self.round.resolved {
            Err(DomainError::conflict(
                ConflictKind::PhaseResolved,
                format!("{action} arrived after the phase resolved"),
            ))
        } else {
            Ok(())
        }
    }
}
