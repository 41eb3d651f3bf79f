use std::path::PathBuf;

use crate::config::parse_var;
use crate::error::AppError;

/// Network and filesystem settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding `<lang>.json` card packs.
    pub cards_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("WILDCARDS_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_var(&lookup, "WILDCARDS_PORT", 3001u16)?;
        let cards_dir = lookup("WILDCARDS_CARDS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));

        Ok(Self {
            host,
            port,
            cards_dir,
        })
    }
}
