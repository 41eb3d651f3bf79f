//! One tokio task per session.
//!
//! The task owns its `Game` and applies commands strictly one after another,
//! then turns the game's timer requests into sleeping tasks that report back
//! through the same queue.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use super::player_actions::GameCommand;
use super::timers::TimerRequest;
use super::Game;
use crate::domain::state::TimerId;
use crate::protocol::game_state::GameSummary;
use crate::protocol::messages::{JoinFailure, ServerMsg};

/// Cheap, cloneable address of a running session.
#[derive(Debug, Clone)]
pub struct GameHandle {
    id: Arc<str>,
    tx: mpsc::UnboundedSender<GameCommand>,
    summary: Arc<RwLock<GameSummary>>,
}

impl GameHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a command. `false` once the session task has finished.
    pub fn send(&self, cmd: GameCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    /// Latest published listing entry.
    pub fn summary(&self) -> GameSummary {
        self.summary.read().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Start the task driving `game`. `on_close` runs once the game has closed.
pub fn spawn_game<F>(game: Game, on_close: F) -> GameHandle
where
    F: FnOnce(&str) + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = GameHandle {
        id: Arc::from(game.id()),
        tx: tx.clone(),
        summary: game.shared_summary(),
    };
    tokio::spawn(run(game, rx, tx.downgrade(), on_close));
    handle
}

async fn run<F>(
    mut game: Game,
    mut rx: mpsc::UnboundedReceiver<GameCommand>,
    timeouts: mpsc::WeakUnboundedSender<GameCommand>,
    on_close: F,
) where
    F: FnOnce(&str) + Send + 'static,
{
    let mut sleeping: HashMap<TimerId, AbortHandle> = HashMap::new();
    info!(game_id = %game.id(), "[GAME] session task started");

    while let Some(cmd) = rx.recv().await {
        if let GameCommand::Timeout(id) = &cmd {
            sleeping.remove(id);
        }
        game.handle(cmd);
        schedule(&mut game, &timeouts, &mut sleeping);
        if game.is_closed() {
            break;
        }
    }

    for (_, task) in sleeping.drain() {
        task.abort();
    }

    // Joins that raced the shutdown get a definite answer.
    rx.close();
    while let Ok(cmd) = rx.try_recv() {
        if let GameCommand::Join { connection, .. } = cmd {
            connection.send(ServerMsg::JoinFailed {
                reason: JoinFailure::NotFound,
            });
        }
    }

    on_close(game.id());
    info!(game_id = %game.id(), "[GAME] session task finished");
}

fn schedule(
    game: &mut Game,
    timeouts: &mpsc::WeakUnboundedSender<GameCommand>,
    sleeping: &mut HashMap<TimerId, AbortHandle>,
) {
    for request in game.take_timer_requests() {
        match request {
            TimerRequest::Arm { id, after } => {
                let timeouts = timeouts.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if let Some(tx) = timeouts.upgrade() {
                        let _ = tx.send(GameCommand::Timeout(id));
                    }
                });
                debug!(game_id = %game.id(), timer_id = %id, ?after, "[GAME] timer armed");
                sleeping.insert(id, task.abort_handle());
            }
            TimerRequest::Disarm { id } => {
                if let Some(task) = sleeping.remove(&id) {
                    task.abort();
                    debug!(game_id = %game.id(), timer_id = %id, "[GAME] timer cancelled");
                }
            }
        }
    }
}
