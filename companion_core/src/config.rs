use std::fmt;

use serde::{Deserialize, Serialize};

use crate::MAX_AGENTS;

/// Represents errors in a game configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Parameter '{0}' must be positive")]
    NotPositive(&'static str),
    #[error("{num_agents} agents requested but at most {max} are supported")]
    TooManyAgents { num_agents: usize, max: usize },
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("Invalid value '{value}' for parameter '{key}'")]
    InvalidValue { key: String, value: String },
}

/// Dimensions and length of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Maximum number of turns before the episode is forced to end.
    pub horizon: usize,
    #[serde(alias = "players")]
    pub num_agents: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            rows: 8,
            cols: 8,
            horizon: 100,
            num_agents: 2,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::NotPositive("rows"));
        }
        if self.cols == 0 {
            return Err(ConfigError::NotPositive("cols"));
        }
        if self.horizon == 0 {
            return Err(ConfigError::NotPositive("horizon"));
        }
        if self.num_agents == 0 {
            return Err(ConfigError::NotPositive("num_agents"));
        }
        if self.num_agents > MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                num_agents: self.num_agents,
                max: MAX_AGENTS,
            });
        }
        Ok(())
    }

    /// Sets a single parameter from its textual form. `players` is accepted as
    /// another name for `num_agents`.
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let slot = match key {
            "rows" => &mut self.rows,
            "cols" => &mut self.cols,
            "horizon" => &mut self.horizon,
            "num_agents" | "players" => &mut self.num_agents,
            _ => return Err(ConfigError::UnknownParameter(key.to_string())),
        };
        *slot = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
            })?;
        Ok(())
    }
}

impl fmt::Display for GameConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={},cols={},horizon={},num_agents={}",
            self.rows, self.cols, self.horizon, self.num_agents
        )
    }
}
