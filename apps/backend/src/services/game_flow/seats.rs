use tracing::{debug, info};
use uuid::Uuid;

use super::timers::TimerKind;
use super::Game;
use crate::domain::seat::{Connection, Identity, PlayerId, Seat};
use crate::domain::state::Phase;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::protocol::messages::{Invitee, JoinFailure, ServerMsg, StopReason};

const MAX_CHAT_LEN: usize = 1000;

impl Game {
    /// Seat a connected participant, or hand an existing seat its new connection.
    ///
    /// The joiner gets the acknowledgement, one `join` per seat already at the
    /// table, then the state snapshot. A resumed seat also receives its full
    /// hand.
    pub fn add_player(
        &mut self,
        identity: Identity,
        connection: Connection,
        created: bool,
    ) -> Result<(), DomainError> {
        let id = identity.id.clone();
        let known = self.roster.contains(&id);
        if !known && self.roster.is_full() {
            connection.send(ServerMsg::JoinFailed {
                reason: JoinFailure::Full,
            });
            return Err(DomainError::conflict(
                ConflictKind::GameFull,
                format!("{} seats taken", self.roster.len()),
            ));
        }

        let game = self.summary();
        connection.send(if created {
            ServerMsg::Created { game }
        } else {
            ServerMsg::Joined { game }
        });
        for seat in self.roster.iter() {
            connection.send(ServerMsg::Join {
                seat: seat.summary(),
            });
        }

        if known {
            let Some(seat) = self.roster.get_mut(&id) else {
                return Err(DomainError::internal("seat vanished while resuming"));
            };
            seat.attach(connection);
            let summary = seat.summary();
            let hand = seat.hand().to_vec();
            self.broadcast(ServerMsg::Update { seat: summary });
            self.send_to(
                &id,
                ServerMsg::Cards {
                    clear: true,
                    add: hand,
                    del: Vec::new(),
                },
            );
            info!(game_id = %self.id, player_id = %id, "[GAME] seat resumed");
        } else {
            let seat = Seat::connected(identity, connection);
            let summary = seat.summary();
            self.roster.push(seat)?;
            self.broadcast(ServerMsg::Join { seat: summary });
            info!(game_id = %self.id, player_id = %id, "[GAME] seat added");
        }

        self.send_to(
            &id,
            ServerMsg::State {
                state: self.snapshot(),
            },
        );
        self.publish();
        Ok(())
    }

    /// Add not-yet-connected placeholder seats. Returns how many were added.
    pub fn invite(&mut self, by: &PlayerId, invitees: Vec<Invitee>) -> Result<usize, DomainError> {
        if !self.roster.contains(by) {
            return Err(DomainError::forbidden(format!("{by} is not seated here")));
        }
        let mut added = 0;
        for invitee in invitees {
            if self.roster.is_full() {
                break;
            }
            let identity = match Identity::new(&invitee.id, &invitee.name) {
                Ok(identity) => identity,
                Err(err) => {
                    debug!(game_id = %self.id, error = %err, "[GAME] skipping invalid invitee");
                    continue;
                }
            };
            if self.roster.contains(&identity.id) {
                continue;
            }
            let seat = Seat::placeholder(identity);
            let summary = seat.summary();
            self.roster.push(seat)?;
            self.broadcast(ServerMsg::Join { seat: summary });
            added += 1;
        }
        info!(game_id = %self.id, player_id = %by, added, "[GAME] invited");
        Ok(added)
    }

    /// A seat leaves voluntarily.
    ///
    /// The running judge is not removed: the request is handled as a
    /// disconnect so the round can still resolve.
    pub fn leave(&mut self, id: &PlayerId) -> Result<(), DomainError> {
        let Some(seat) = self.roster.get(id) else {
            return Err(DomainError::not_found(NotFoundKind::Seat, id.to_string()));
        };
        seat.send(ServerMsg::MeLeft);

        if self.is_running() && self.round.is_judge(id) {
            info!(game_id = %self.id, player_id = %id, "[GAME] judge leaving; keeping seat");
            if let Some(conn) = seat.connection_id() {
                self.disconnect(id, conn)?;
            }
            return Ok(());
        }
        self.remove_seat(id);
        Ok(())
    }

    /// Host removes another seat. Never itself, never the running judge.
    pub fn kick(&mut self, by: &PlayerId, target: &PlayerId) -> Result<(), DomainError> {
        self.require_host(by, "kick")?;
        if by == target {
            return Err(DomainError::forbidden("host cannot kick itself"));
        }
        if self.is_running() && self.round.is_judge(target) {
            return Err(DomainError::forbidden(format!(
                "{target} is judging and cannot be kicked"
            )));
        }
        let Some(seat) = self.roster.get(target) else {
            return Err(DomainError::not_found(NotFoundKind::Seat, target.to_string()));
        };
        seat.send(ServerMsg::MeLeft);
        info!(game_id = %self.id, host = %by, player_id = %target, "[GAME] kicked");
        self.remove_seat(target);
        Ok(())
    }

    /// The transport behind `connection_id` went away.
    ///
    /// The seat stays as a disconnected placeholder. A disconnect for an
    /// older connection than the one attached is ignored.
    pub fn disconnect(&mut self, id: &PlayerId, connection_id: Uuid) -> Result<(), DomainError> {
        let Some(seat) = self.roster.get_mut(id) else {
            return Err(DomainError::not_found(NotFoundKind::Seat, id.to_string()));
        };
        if seat.connection_id() != Some(connection_id) {
            debug!(game_id = %self.id, player_id = %id, "[GAME] stale disconnect ignored");
            return Ok(());
        }
        seat.detach();
        let summary = seat.summary();
        info!(game_id = %self.id, player_id = %id, "[GAME] seat disconnected");
        self.broadcast(ServerMsg::Update { seat: summary });
        self.after_departure();
        Ok(())
    }

    /// Host flips discovery visibility.
    pub fn toggle_private(&mut self, by: &PlayerId) -> Result<(), DomainError> {
        self.require_host(by, "change visibility")?;
        self.private = !self.private;
        info!(game_id = %self.id, private = self.private, "[GAME] visibility changed");
        self.publish();
        self.broadcast(ServerMsg::GameUpdate {
            game: self.summary(),
        });
        Ok(())
    }

    /// Relay a chat line to every connected seat.
    pub fn chat(&mut self, by: &PlayerId, message: String) -> Result<(), DomainError> {
        let Some(seat) = self.roster.get(by) else {
            return Err(DomainError::forbidden(format!("{by} is not seated here")));
        };
        if message.is_empty() || message.chars().count() > MAX_CHAT_LEN {
            return Err(DomainError::validation(format!(
                "chat message must be 1..={MAX_CHAT_LEN} characters"
            )));
        }
        let seat = seat.summary();
        self.broadcast(ServerMsg::Chat { seat, message });
        Ok(())
    }

    /// Drop a seat from the roster.
    ///
    /// A seat that still owes an answer submits from its own hand first, so
    /// judgment keeps one entry per seat that was asked to answer.
    fn remove_seat(&mut self, id: &PlayerId) {
        if !self.roster.contains(id) {
            return;
        }
        let owed_answer = self.phase == Phase::AwaitingAnswers && self.round.is_pending(id);
        if owed_answer {
            self.timers.disarm_kind(&TimerKind::Select(id.clone()));
            self.submit_answer(id, None, true, false);
        }

        let Some(seat) = self.roster.get(id) else {
            return;
        };
        self.broadcast(ServerMsg::Left {
            seat: seat.summary(),
        });
        self.roster.remove(id);
        info!(game_id = %self.id, player_id = %id, "[GAME] seat removed");

        self.after_departure();

        if owed_answer
            && self.phase == Phase::AwaitingAnswers
            && self.round.pending.is_empty()
        {
            self.enter_judgment();
        }
    }

    /// Bookkeeping after a seat disconnected or was removed: close when
    /// nobody is left, hand over the host role, stop when understaffed.
    fn after_departure(&mut self) {
        let connected = self.roster.connected_count();
        if connected == 0 {
            self.close();
            self.publish();
            return;
        }

        let host_present = self
            .roster
            .get(&self.host)
            .is_some_and(Seat::is_connected);
        if !host_present {
            self.succeed_host();
        }

        if self.is_running() && connected < self.config.min_players {
            info!(game_id = %self.id, connected, "[GAME] not enough players left");
            self.stop(StopReason::Understaffed);
        }
        self.publish();
    }

    /// First connected seat in roster order becomes host.
    fn succeed_host(&mut self) {
        let Some(next) = self.roster.first_connected().cloned() else {
            return;
        };
        if next == self.host {
            return;
        }
        self.host = next;
        let Some(seat) = self.roster.get(&self.host) else {
            return;
        };
        let summary = seat.summary();
        info!(game_id = %self.id, host = %self.host, "[GAME] new host");
        self.broadcast(ServerMsg::NewHost { seat: summary });
    }
}
