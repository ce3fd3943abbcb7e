use std::fmt;

use crate::{
    NUM_ACTIONS,
    config::{ConfigError, GameConfig},
    environment::{DEATH_PENALTY, Episode, EpisodeError, STEP_REWARD, SUCCESS_REWARD},
    observation,
    registry::GameRegistration,
};

/// A registered game with a fixed configuration. Produces initial episodes
/// and answers the static questions hosts ask before playing.
#[derive(Debug, Clone, Copy)]
pub struct Game {
    registration: &'static GameRegistration,
    config: GameConfig,
}

impl Game {
    pub fn new(
        registration: &'static GameRegistration,
        config: GameConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Game {
            registration,
            config,
        })
    }

    pub fn short_name(&self) -> &'static str {
        self.registration.short_name
    }

    pub fn long_name(&self) -> &'static str {
        self.registration.long_name
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn num_distinct_actions(&self) -> usize {
        NUM_ACTIONS
    }

    pub fn num_players(&self) -> usize {
        self.config.num_agents
    }

    /// Worst return: dying on the last turn after paying every step before it.
    pub fn min_utility(&self) -> f64 {
        DEATH_PENALTY + STEP_REWARD * self.config.horizon as f64
    }

    /// Best return: winning on the first turn.
    pub fn max_utility(&self) -> f64 {
        SUCCESS_REWARD + STEP_REWARD
    }

    pub fn observation_tensor_shape(&self) -> [usize; 3] {
        observation::tensor_shape(self.config.rows, self.config.cols)
    }

    pub fn observation_tensor_size(&self) -> usize {
        observation::tensor_size(self.config.rows, self.config.cols)
    }

    pub fn information_state_tensor_shape(&self) -> [usize; 3] {
        self.observation_tensor_shape()
    }

    pub fn max_game_length(&self) -> usize {
        self.config.horizon
    }

    pub fn new_initial_state(&self) -> Result<Episode, EpisodeError> {
        Episode::new(self.config, (self.registration.variant)())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.short_name(), self.config)
    }
}
