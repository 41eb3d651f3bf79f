use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::config::game::GameConfig;
use crate::domain::seat::{Connection, Identity};
use crate::error::AppError;
use crate::protocol::game_state::GameSummary;
use crate::services::card_packs::CardPacks;
use crate::services::game_flow::{spawn_game, Game, GameCommand, GameHandle};
use crate::utils::session_id::generate_session_id;

/// Fresh ids drawn before giving up on `create`.
const MAX_ID_ATTEMPTS: usize = 8;

/// Directory of live games, keyed by session id.
///
/// The registry only holds handles. Game state lives in each game's task and
/// is reached through commands; listings read the summaries the games
/// publish.
pub struct GameRegistry {
    games: DashMap<String, GameHandle>,
    packs: Arc<CardPacks>,
    config: Arc<GameConfig>,
}

impl GameRegistry {
    pub fn new(packs: Arc<CardPacks>, config: Arc<GameConfig>) -> Arc<Self> {
        Arc::new(Self {
            games: DashMap::new(),
            packs,
            config,
        })
    }

    pub fn packs(&self) -> &CardPacks {
        &self.packs
    }

    /// Create a game for `language` with `identity` as host and first seat.
    ///
    /// The creator's `created` acknowledgement arrives through `connection`
    /// once the game task has seated it.
    pub fn create(
        self: &Arc<Self>,
        language: &str,
        identity: Identity,
        connection: Connection,
    ) -> Result<GameHandle, AppError> {
        let template = self.packs.template(language)?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_session_id();
            let Entry::Vacant(slot) = self.games.entry(id.clone()) else {
                debug!(game_id = %id, "[REGISTRY] id collision, drawing again");
                continue;
            };

            let game = Game::new(
                id.as_str(),
                Arc::clone(&template),
                identity.id.clone(),
                Arc::clone(&self.config),
            );
            let registry = Arc::downgrade(self);
            let handle = spawn_game(game, move |closed| {
                if let Some(registry) = registry.upgrade() {
                    registry.remove(closed);
                }
            });
            slot.insert(handle.clone());

            info!(game_id = %id, language, host = %identity.id, "[REGISTRY] game created");
            handle.send(GameCommand::Join {
                identity,
                connection,
                created: true,
            });
            return Ok(handle);
        }

        Err(AppError::internal("could not allocate a free game id"))
    }

    pub fn get(&self, id: &str) -> Option<GameHandle> {
        self.games
            .get(id)
            .map(|entry| entry.value().clone())
            .filter(|handle| !handle.is_finished())
    }

    /// Public games as anyone outside them may see them.
    pub fn list_public(&self) -> Vec<GameSummary> {
        let mut games: Vec<GameSummary> = self
            .games
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .map(|entry| entry.value().summary())
            .filter(|summary| !summary.private)
            .map(|summary| summary.redacted())
            .collect();
        games.sort_by(|a, b| a.id.cmp(&b.id));
        games
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Drop a finished game. A live game under the same id is left alone.
    pub fn remove(&self, id: &str) {
        if self
            .games
            .remove_if(id, |_, handle| handle.is_finished())
            .is_some()
        {
            info!(game_id = %id, "[REGISTRY] game removed");
        }
    }
}
