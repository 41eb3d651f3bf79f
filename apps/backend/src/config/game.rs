//! Per-game rules and timing.

use std::time::Duration;

use crate::config::parse_var;
use crate::error::AppError;

/// Rules and timers shared by every game a registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Fewest connected seats a running game tolerates.
    pub min_players: usize,
    /// Roster capacity, placeholders included.
    pub max_players: usize,
    /// Answer cards each connected seat holds at the start of a round.
    pub hand_size: usize,
    /// Window the judge has to pick a prompt card.
    pub pick_timeout: Duration,
    /// Window the other seats have to submit answers.
    pub select_timeout: Duration,
    /// Window the judge has to choose a winner.
    pub judgment_timeout: Duration,
    /// Added to the select and judgment timers to tolerate last-moment actions.
    pub grace: Duration,
    /// How long the round winner stays on display before the next round.
    pub winner_display: Duration,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 9,
            hand_size: 10,
            pick_timeout: Duration::from_secs(10),
            select_timeout: Duration::from_secs(30),
            judgment_timeout: Duration::from_secs(30),
            grace: Duration::from_secs(3),
            winner_display: Duration::from_secs(3),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup; unset variables keep their defaults.
    /// Timeouts are given in whole seconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let secs = |name: &str, default: Duration| -> Result<Duration, AppError> {
            parse_var(&lookup, name, default.as_secs()).map(Duration::from_secs)
        };

        let seed = match lookup("WILDCARDS_SEED") {
            None => None,
            Some(_) => Some(parse_var(&lookup, "WILDCARDS_SEED", 0u64)?),
        };

        let cfg = Self {
            min_players: parse_var(&lookup, "WILDCARDS_MIN_PLAYERS", d.min_players)?,
            max_players: parse_var(&lookup, "WILDCARDS_MAX_PLAYERS", d.max_players)?,
            hand_size: parse_var(&lookup, "WILDCARDS_HAND_SIZE", d.hand_size)?,
            pick_timeout: secs("WILDCARDS_PICK_TIMEOUT", d.pick_timeout)?,
            select_timeout: secs("WILDCARDS_SELECT_TIMEOUT", d.select_timeout)?,
            judgment_timeout: secs("WILDCARDS_JUDGMENT_TIMEOUT", d.judgment_timeout)?,
            grace: secs("WILDCARDS_GRACE", d.grace)?,
            winner_display: secs("WILDCARDS_WINNER_DISPLAY", d.winner_display)?,
            seed,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_players < 2 {
            return Err(AppError::config("min_players must be at least 2"));
        }
        if self.max_players < self.min_players {
            return Err(AppError::config(format!(
                "max_players ({}) must not be below min_players ({})",
                self.max_players, self.min_players
            )));
        }
        if self.hand_size == 0 {
            return Err(AppError::config("hand_size must be positive"));
        }
        Ok(())
    }

    /// Timer for a seat's answer submission.
    pub fn select_window(&self) -> Duration {
        self.select_timeout + self.grace
    }

    /// Timer for the judge's winner choice.
    pub fn judgment_window(&self) -> Duration {
        self.judgment_timeout + self.grace
    }
}
