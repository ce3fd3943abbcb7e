//! Static table of the playable games and the loader for host-style game
//! strings such as `companion_synchro(rows=3,cols=3,players=2)`.

use tracing::debug;

use crate::{
    config::{ConfigError, GameConfig},
    game::Game,
    variants::Variant,
};

/// One entry of [`REGISTRY`].
#[derive(Debug)]
pub struct GameRegistration {
    pub short_name: &'static str,
    pub long_name: &'static str,
    /// Builds a fresh variant for every new episode.
    pub variant: fn() -> Variant,
}

pub static REGISTRY: &[GameRegistration] = &[
    GameRegistration {
        short_name: "companion_simple",
        long_name: "Companion Simple Environment",
        variant: Variant::goal,
    },
    GameRegistration {
        short_name: "companion_synchro",
        long_name: "Companion Synchro Environment",
        variant: Variant::synchro,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown game '{0}'")]
    UnknownGame(String),
    #[error("Malformed game string '{0}'")]
    Malformed(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn registration(short_name: &str) -> Option<&'static GameRegistration> {
    REGISTRY.iter().find(|entry| entry.short_name == short_name)
}

/// Loads a game from `name` or `name(key=value,...)`. Parameters not given
/// keep their defaults.
pub fn load_game(game_string: &str) -> Result<Game, RegistryError> {
    let malformed = || RegistryError::Malformed(game_string.to_string());
    let trimmed = game_string.trim();

    let (name, params) = match trimmed.split_once('(') {
        Some((name, rest)) => (name, Some(rest.strip_suffix(')').ok_or_else(malformed)?)),
        None => (trimmed, None),
    };

    let mut config = GameConfig::default();
    for param in params
        .into_iter()
        .flat_map(|params| params.split(','))
        .map(str::trim)
        .filter(|param| !param.is_empty())
    {
        let (key, value) = param.split_once('=').ok_or_else(malformed)?;
        config.set_param(key.trim(), value.trim())?;
    }
    load_game_with(name.trim(), config)
}

/// Loads a registered game with an explicit configuration.
pub fn load_game_with(short_name: &str, config: GameConfig) -> Result<Game, RegistryError> {
    let entry = registration(short_name)
        .ok_or_else(|| RegistryError::UnknownGame(short_name.to_string()))?;
    let game = Game::new(entry, config)?;
    debug!(%game, "game loaded");
    Ok(game)
}
