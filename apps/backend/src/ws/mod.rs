//! WebSocket transport and the directory of live games.

pub mod hub;
pub mod session;
