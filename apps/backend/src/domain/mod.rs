//! Domain layer: decks, seats and round state. No I/O.

pub mod cards;
pub mod roster;
pub mod seat;
pub mod state;

// Re-exports for ergonomics
pub use cards::{count_blanks, pick_index, shuffle, CardKind, Deck, DeckTemplate};
pub use roster::Roster;
pub use seat::{Connection, Identity, PlayerId, Seat};
pub use state::{Phase, RoundState, Submission, TimerId};
