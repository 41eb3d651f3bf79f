//! Runtime configuration read from the environment.

pub mod game;
pub mod server;

pub use game::GameConfig;
pub use server::ServerConfig;

use crate::error::AppError;

/// Parse an optional variable through `lookup`, falling back to `default`.
pub(crate) fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AppError::config(format!(
                "Environment variable '{name}' has an invalid value: '{raw}'"
            ))
        }),
    }
}
