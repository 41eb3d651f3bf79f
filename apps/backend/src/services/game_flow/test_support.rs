//! Test-only table setup for coordinator unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use super::{Game, TimerKind};
use crate::config::game::GameConfig;
use crate::domain::cards::DeckTemplate;
use crate::domain::seat::{Connection, Identity, PlayerId};
use crate::protocol::messages::ServerMsg;

pub fn pid(id: &str) -> PlayerId {
    PlayerId::parse(id).unwrap()
}

pub fn config() -> GameConfig {
    GameConfig {
        hand_size: 3,
        seed: Some(7),
        ..GameConfig::default()
    }
}

/// One-blank prompts and plenty of answers unless stated otherwise.
pub fn template(prompts: usize, answers: usize) -> Arc<DeckTemplate> {
    Arc::new(DeckTemplate::new(
        "en",
        "English",
        None,
        (0..prompts).map(|i| format!("Prompt {i} is _.")).collect(),
        (0..answers).map(|i| format!("answer {i}")).collect(),
    ))
}

/// Receiving side of one seat's connection.
pub struct Inbox {
    pub conn_id: Uuid,
    rx: UnboundedReceiver<ServerMsg>,
}

impl Inbox {
    pub fn drain(&mut self) -> Vec<ServerMsg> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

pub struct Table {
    pub game: Game,
    pub inboxes: BTreeMap<String, Inbox>,
}

impl Table {
    /// Game hosted by "1" with seats "1".."n" connected in that order.
    pub fn new(players: usize) -> Self {
        Self::with(players, config(), template(20, 60))
    }

    pub fn with(players: usize, config: GameConfig, template: Arc<DeckTemplate>) -> Self {
        let game = Game::new("g1", template, pid("1"), Arc::new(config));
        let mut table = Self {
            game,
            inboxes: BTreeMap::new(),
        };
        for i in 1..=players {
            table.join(&i.to_string()).unwrap();
        }
        table.drain_all();
        table
    }

    pub fn join(&mut self, id: &str) -> Result<(), crate::errors::domain::DomainError> {
        let (conn, rx) = Connection::channel();
        let conn_id = conn.id();
        let created = self.inboxes.is_empty();
        let identity = Identity::new(id, &format!("Player {id}")).unwrap();
        self.inboxes.insert(id.to_string(), Inbox { conn_id, rx });
        self.game.add_player(identity, conn, created)
    }

    pub fn inbox(&mut self, id: &str) -> &mut Inbox {
        self.inboxes.get_mut(id).unwrap()
    }

    pub fn drain(&mut self, id: &str) -> Vec<ServerMsg> {
        self.inbox(id).drain()
    }

    pub fn drain_all(&mut self) {
        for inbox in self.inboxes.values_mut() {
            inbox.drain();
        }
    }

    pub fn disconnect(&mut self, id: &str) {
        let conn_id = self.inboxes[id].conn_id;
        self.game.disconnect(&pid(id), conn_id).unwrap();
    }

    /// Fire the armed timer of `kind`. Panics if none is armed.
    pub fn fire(&mut self, kind: TimerKind) {
        let id = self
            .game
            .armed_timer(&kind)
            .unwrap_or_else(|| panic!("no {kind:?} timer armed"));
        self.game.on_timeout(id);
    }

    pub fn hand(&self, id: &str) -> Vec<String> {
        self.game.seat(&pid(id)).unwrap().hand().to_vec()
    }

    pub fn score(&self, id: &str) -> u32 {
        self.game.seat(&pid(id)).unwrap().score()
    }

    /// Start and let the judge pick, landing in the answer phase.
    pub fn start_and_pick(&mut self) {
        self.game.start(&pid("1")).unwrap();
        let judge = self.game.judge().unwrap().clone();
        self.game.pick(&judge).unwrap();
        self.drain_all();
    }
}
