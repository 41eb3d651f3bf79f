//! Participant identity, connection handles and the per-game seat.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::domain::DomainError;
use crate::protocol::game_state::SeatSummary;
use crate::protocol::messages::ServerMsg;

const MAX_ID_LEN: usize = 64;
const MAX_NAME_LEN: usize = 64;

/// Stable participant identity; the single lookup key for seats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_ID_LEN {
            return Err(DomainError::validation(format!(
                "player id must be 1..={MAX_ID_LEN} characters"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::validation("player id contains control characters"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a participant is. Immutable for the lifetime of a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: PlayerId,
    pub name: String,
}

impl Identity {
    pub fn new(id: &str, name: &str) -> Result<Self, DomainError> {
        let id = PlayerId::parse(id)?;
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "display name must be 1..={MAX_NAME_LEN} characters"
            )));
        }
        Ok(Self {
            id,
            name: name.to_string(),
        })
    }
}

/// Outbound half of one live transport connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: Uuid,
    tx: mpsc::UnboundedSender<ServerMsg>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<ServerMsg>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tx,
        }
    }

    /// New connection plus the receiving end a transport (or test) drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a message; `false` when the transport side is gone.
    pub fn send(&self, msg: ServerMsg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// One participant's place in a game.
///
/// A seat outlives its connection: disconnecting only clears the handle so
/// the same identity can resume with score and hand intact.
#[derive(Debug)]
pub struct Seat {
    identity: Identity,
    connection: Option<Connection>,
    score: u32,
    hand: Vec<String>,
}

impl Seat {
    /// Seat for a participant who is present right now.
    pub fn connected(identity: Identity, connection: Connection) -> Self {
        Self {
            identity,
            connection: Some(connection),
            score: 0,
            hand: Vec::new(),
        }
    }

    /// Invited placeholder, not yet connected.
    pub fn placeholder(identity: Identity) -> Self {
        Self {
            identity,
            connection: None,
            score: 0,
            hand: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.identity.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection_id(&self) -> Option<Uuid> {
        self.connection.as_ref().map(Connection::id)
    }

    pub fn attach(&mut self, connection: Connection) {
        self.connection = Some(connection);
    }

    pub fn detach(&mut self) -> Option<Connection> {
        self.connection.take()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn award_point(&mut self) {
        self.score += 1;
    }

    pub fn hand(&self) -> &[String] {
        &self.hand
    }

    pub fn holds(&self, card: &str) -> bool {
        self.hand.iter().any(|c| c == card)
    }

    /// Remove one copy of `card` from the hand.
    pub fn take_card(&mut self, card: &str) -> Option<String> {
        let index = self.hand.iter().position(|c| c == card)?;
        Some(self.hand.remove(index))
    }

    /// Remove the card at `index` from the hand.
    pub fn take_card_at(&mut self, index: usize) -> Option<String> {
        if index < self.hand.len() {
            Some(self.hand.remove(index))
        } else {
            None
        }
    }

    pub fn add_card(&mut self, card: String) {
        self.hand.push(card);
    }

    pub fn clear_hand(&mut self) {
        self.hand.clear();
    }

    /// Deliver a message if connected. Returns whether it was queued.
    pub fn send(&self, msg: ServerMsg) -> bool {
        match &self.connection {
            Some(conn) => conn.send(msg),
            None => false,
        }
    }

    pub fn summary(&self) -> SeatSummary {
        SeatSummary {
            id: self.identity.id.clone(),
            name: self.identity.name.clone(),
            score: self.score,
            connected: self.is_connected(),
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}[connected={}]",
            self.identity.id,
            self.identity.name,
            self.is_connected()
        )
    }
}
