#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod health;
pub mod protocol;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
pub mod ws;


// Re-exports for public API
pub use config::{GameConfig, ServerConfig};
pub use error::AppError;
pub use services::card_packs::CardPacks;
pub use state::app_state::AppState;
pub use ws::hub::GameRegistry;

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
