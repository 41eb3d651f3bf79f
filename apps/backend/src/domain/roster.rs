//! Ordered seat list of one game.
//!
//! Insertion order is turn order: judge rotation and host succession both
//! walk the roster front to back.

use crate::domain::seat::{PlayerId, Seat};
use crate::errors::domain::{ConflictKind, DomainError};
use crate::protocol::messages::ServerMsg;

#[derive(Debug)]
pub struct Roster {
    seats: Vec<Seat>,
    capacity: usize,
}

impl Roster {
    pub fn new(capacity: usize) -> Self {
        Self {
            seats: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Seat> {
        self.seats.iter_mut()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: &PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.id() == id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Seat> {
        self.seats.iter_mut().find(|s| s.id() == id)
    }

    /// Append a new seat at the end of the turn order.
    pub fn push(&mut self, seat: Seat) -> Result<(), DomainError> {
        if self.contains(seat.id()) {
            return Err(DomainError::conflict(
                ConflictKind::Other("duplicate seat".into()),
                format!("player {} already has a seat", seat.id()),
            ));
        }
        if self.is_full() {
            return Err(DomainError::conflict(
                ConflictKind::GameFull,
                format!("roster holds {} seats", self.capacity),
            ));
        }
        self.seats.push(seat);
        Ok(())
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<Seat> {
        let index = self.position(id)?;
        Some(self.seats.remove(index))
    }

    pub fn connected_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_connected()).count()
    }

    /// First connected seat in roster order.
    pub fn first_connected(&self) -> Option<&PlayerId> {
        self.seats.iter().find(|s| s.is_connected()).map(Seat::id)
    }

    /// Next judge after `previous`.
    ///
    /// Walks forward from the previous judge's position and wraps to the
    /// front. Without a previous judge, or when that seat has since left the
    /// roster, the first connected seat is chosen.
    pub fn next_connected_after(&self, previous: Option<&PlayerId>) -> Option<&PlayerId> {
        let Some(previous) = previous else {
            return self.first_connected();
        };
        let Some(start) = self.position(previous) else {
            return self.first_connected();
        };
        self.seats[start + 1..]
            .iter()
            .find(|s| s.is_connected())
            .map(Seat::id)
            .or_else(|| self.first_connected())
    }

    /// Send to every connected seat.
    pub fn broadcast(&self, msg: &ServerMsg) {
        for seat in &self.seats {
            seat.send(msg.clone());
        }
    }
}
