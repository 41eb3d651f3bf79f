use std::sync::Arc;

use crate::config::game::GameConfig;
use crate::services::card_packs::CardPacks;
use crate::ws::hub::GameRegistry;

/// Application state shared by every HTTP worker and WebSocket session
#[derive(Clone)]
pub struct AppState {
    /// Directory of live games
    pub registry: Arc<GameRegistry>,
    /// Loaded card packs, keyed by language
    pub packs: Arc<CardPacks>,
    /// Rules every new game is created with
    pub game_config: Arc<GameConfig>,
}

impl AppState {
    pub fn new(packs: CardPacks, game_config: GameConfig) -> Self {
        let packs = Arc::new(packs);
        let game_config = Arc::new(game_config);
        Self {
            registry: GameRegistry::new(Arc::clone(&packs), Arc::clone(&game_config)),
            packs,
            game_config,
        }
    }

    pub fn registry(&self) -> Arc<GameRegistry> {
        Arc::clone(&self.registry)
    }
}
