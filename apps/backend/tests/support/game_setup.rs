//! Game setup helpers for integration tests
//!
//! Builds games through the public coordinator API with in-memory card packs,
//! so tests never touch the filesystem or the network.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use wildcards_backend::config::GameConfig;
use wildcards_backend::domain::{Connection, DeckTemplate, Identity, PlayerId};
use wildcards_backend::protocol::messages::ServerMsg;
use wildcards_backend::services::game_flow::{Game, TimerKind};
use wildcards_backend::CardPacks;

/// English pack with single-blank prompts.
pub fn english_pack(prompts: usize, answers: usize) -> CardPacks {
    CardPacks::from_templates([DeckTemplate::new(
        "en",
        "English",
        None,
        (0..prompts).map(|i| format!("Prompt {i}: _.")).collect(),
        (0..answers).map(|i| format!("Answer {i}")).collect(),
    )])
}

/// Defaults with a small hand and a fixed seed.
pub fn test_config() -> GameConfig {
    GameConfig {
        hand_size: 5,
        seed: Some(12345),
        ..GameConfig::default()
    }
}

pub struct TestPlayer {
    pub id: PlayerId,
    pub connection: Connection,
    pub rx: UnboundedReceiver<ServerMsg>,
}

impl TestPlayer {
    pub fn new(id: &str) -> Self {
        let (connection, rx) = Connection::channel();
        Self {
            id: PlayerId::parse(id).expect("valid player id"),
            connection,
            rx,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.id.as_str(), &format!("Player {}", self.id)).expect("valid identity")
    }

    pub fn drain(&mut self) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

/// A game driven synchronously, with timers fired by hand.
pub struct GameSetup {
    pub game: Game,
    pub players: Vec<TestPlayer>,
}

impl GameSetup {
    /// `count` seated players; the first one hosts.
    pub fn with_players(count: usize) -> Self {
        Self::with(count, test_config(), english_pack(20, 100))
    }

    pub fn with(count: usize, config: GameConfig, packs: CardPacks) -> Self {
        let template = packs.template("en").expect("en pack loaded");
        let players: Vec<TestPlayer> = (0..count).map(|i| TestPlayer::new(&format!("p{i}"))).collect();
        let host = players[0].id.clone();
        let mut setup = Self {
            game: Game::new("abzdefghijklmnop", template, host, Arc::new(config)),
            players,
        };
        for i in 0..count {
            let identity = setup.players[i].identity();
            let connection = setup.players[i].connection.clone();
            setup
                .game
                .add_player(identity, connection, i == 0)
                .expect("seat player");
        }
        setup.drain_all();
        setup
    }

    pub fn id(&self, seat: usize) -> PlayerId {
        self.players[seat].id.clone()
    }

    pub fn drain(&mut self, seat: usize) -> Vec<ServerMsg> {
        self.players[seat].drain()
    }

    pub fn drain_all(&mut self) {
        for player in &mut self.players {
            player.drain();
        }
    }

    pub fn hand(&self, seat: usize) -> Vec<String> {
        self.game
            .seat(&self.players[seat].id)
            .map(|s| s.hand().to_vec())
            .unwrap_or_default()
    }

    pub fn score(&self, seat: usize) -> u32 {
        self.game
            .seat(&self.players[seat].id)
            .map(|s| s.score())
            .unwrap_or_default()
    }

    pub fn fire(&mut self, kind: TimerKind) {
        let id = self
            .game
            .armed_timer(&kind)
            .unwrap_or_else(|| panic!("no {kind:?} timer armed"));
        self.game.on_timeout(id);
    }

    pub fn disconnect(&mut self, seat: usize) {
        let id = self.id(seat);
        let conn = self.players[seat].connection.id();
        self.game.disconnect(&id, conn).expect("disconnect");
    }

    /// Replace the seat's connection and rejoin.
    pub fn reconnect(&mut self, seat: usize) {
        let fresh = TestPlayer::new(self.players[seat].id.as_str());
        let identity = fresh.identity();
        let connection = fresh.connection.clone();
        self.players[seat] = fresh;
        self.game
            .add_player(identity, connection, false)
            .expect("rejoin");
    }
}
