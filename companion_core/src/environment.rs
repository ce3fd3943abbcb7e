use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    Direction, NUM_ACTIONS,
    agent::{AgentKind, AgentState},
    config::{ConfigError, GameConfig},
    observation::{self, TensorSizeError},
    variants::{Variant, VariantStrategy},
    world::{World, WorldError},
};

/// Reward every player receives each turn.
pub const STEP_REWARD: f64 = -1.0;
/// Reward replacing the step reward of an agent that dies this turn.
pub const DEATH_PENALTY: f64 = -100.0;
/// Bonus variants add on top of the turn reward when their objective is met.
pub const SUCCESS_REWARD: f64 = 100.0;

/// Action value as submitted by the caller. Anything outside `0..NUM_ACTIONS`
/// is treated as `Stay`.
pub type RawAction = i64;

/// Represents actions an agent can take in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    Interact = 4,
    Stay = 5,
}

impl Action {
    pub const ALL: [Action; NUM_ACTIONS] = [
        Action::North,
        Action::East,
        Action::South,
        Action::West,
        Action::Interact,
        Action::Stay,
    ];

    /// Decodes a raw action, mapping anything invalid to `Stay`.
    pub fn from_raw(raw: RawAction) -> Action {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Action::ALL.get(index).copied())
            .unwrap_or(Action::Stay)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Movement direction of the four move actions.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::North => Some(Direction::North),
            Action::East => Some(Direction::East),
            Action::South => Some(Direction::South),
            Action::West => Some(Direction::West),
            Action::Interact | Action::Stay => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::North => "North",
            Action::East => "East",
            Action::South => "South",
            Action::West => "West",
            Action::Interact => "Interact",
            Action::Stay => "Stay",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who is expected to act next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentPlayer {
    /// Every player submits an action for the same turn.
    Simultaneous,
    /// The episode is over.
    Terminal,
}

/// Represents errors surfaced by episode queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EpisodeError {
    #[error("Player {player} is out of range for a {num_players}-player game")]
    InvalidPlayer { player: usize, num_players: usize },
    #[error("World is {rows}x{cols} but the configuration asks for {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
    #[error(transparent)]
    TensorSize(#[from] TensorSizeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Setup(#[from] WorldError),
}

/// One simultaneous-move episode: the world plus the episode-level counters.
///
/// Cloning yields a fully independent copy, which is what search and training
/// callers rely on when branching.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    world: World,
    variant: Variant,
    config: GameConfig,
    timestep: usize,
    /// Per-player reward of the last turn, indexed by agent id.
    rewards: Vec<f64>,
    /// Per-player running sum of rewards, indexed by agent id.
    returns: Vec<f64>,
    terminal: bool,
}

impl Episode {
    /// Creates an episode and lets `variant` lay out the initial world.
    pub fn new(config: GameConfig, mut variant: Variant) -> Result<Self, EpisodeError> {
        config.validate()?;
        let mut world = World::new(config.rows, config.cols);
        variant.setup(&mut world, &config)?;
        info!(
            variant = variant.name(),
            rows = config.rows,
            cols = config.cols,
            agents = world.agents().len(),
            horizon = config.horizon,
            "episode created"
        );
        Ok(Self::assemble(world, variant, config))
    }

    /// Creates an episode around an already populated world, skipping the
    /// variant's own layout. The variant still decides termination and rewards.
    pub fn from_world(
        config: GameConfig,
        variant: Variant,
        world: World,
    ) -> Result<Self, EpisodeError> {
        config.validate()?;
        if world.rows() != config.rows || world.cols() != config.cols {
            return Err(EpisodeError::DimensionMismatch {
                rows: world.rows(),
                cols: world.cols(),
                expected_rows: config.rows,
                expected_cols: config.cols,
            });
        }
        Ok(Self::assemble(world, variant, config))
    }

    fn assemble(world: World, variant: Variant, config: GameConfig) -> Self {
        Episode {
            world,
            variant,
            config,
            timestep: 0,
            rewards: vec![0.0; config.num_agents],
            returns: vec![0.0; config.num_agents],
            terminal: false,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn num_players(&self) -> usize {
        self.config.num_agents
    }

    pub fn timestep(&self) -> usize {
        self.timestep
    }

    pub fn horizon(&self) -> usize {
        self.config.horizon
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal || self.timestep >= self.config.horizon
    }

    pub fn current_player(&self) -> CurrentPlayer {
        if self.is_terminal() {
            CurrentPlayer::Terminal
        } else {
            CurrentPlayer::Simultaneous
        }
    }

    /// Rewards earned during the last turn.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Rewards accumulated over the episode so far.
    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Every action is legal for every player until the episode ends.
    pub fn legal_actions(&self, player: usize) -> Result<Vec<Action>, EpisodeError> {
        if self.is_terminal() {
            return Ok(Vec::new());
        }
        self.check_player(player)?;
        Ok(Action::ALL.to_vec())
    }

    pub fn action_to_string(&self, action: RawAction) -> &'static str {
        match usize::try_from(action) {
            Ok(index) if index < NUM_ACTIONS => Action::ALL[index].name(),
            _ => "Invalid action",
        }
    }

    /// Applies one turn. Entry `i` is player `i`'s action; missing or invalid
    /// entries count as `Stay`. Does nothing once the episode is terminal.
    pub fn apply_actions(&mut self, actions: &[RawAction]) {
        let typed: Vec<Action> = (0..self.config.num_agents)
            .map(|player| {
                actions
                    .get(player)
                    .map_or(Action::Stay, |raw| Action::from_raw(*raw))
            })
            .collect();
        self.apply_typed_actions(&typed);
    }

    /// Like [`Episode::apply_actions`] for already decoded actions.
    pub fn apply_typed_actions(&mut self, actions: &[Action]) {
        if self.is_terminal() {
            return;
        }
        let mut actions: Vec<Action> = (0..self.config.num_agents)
            .map(|player| actions.get(player).copied().unwrap_or(Action::Stay))
            .collect();
        self.process_turn(&mut actions);
    }

    fn process_turn(&mut self, actions: &mut [Action]) {
        trace!(timestep = self.timestep, ?actions, "processing turn");
        self.rewards.fill(STEP_REWARD);

        self.update_scripted_agents(actions);

        let mut moves = self.world.predict_moves(actions);
        self.world.resolve_collisions(&mut moves);
        self.world.apply_moves(&moves);

        self.world.process_interactions(actions);

        for id in self.world.remove_dead_agents() {
            debug!(id, timestep = self.timestep, "agent died in lava");
            if let Some(reward) = self.rewards.get_mut(id) {
                *reward = DEATH_PENALTY;
            }
        }

        self.terminal = self.variant.is_terminal(&self.world, &self.config);
        if self.terminal {
            let bonus = self.variant.terminal_rewards(&self.world, &self.config);
            for (reward, extra) in self.rewards.iter_mut().zip(bonus) {
                *reward += extra;
            }
            debug!(timestep = self.timestep, variant = self.variant.name(), "objective reached");
        }

        for (ret, reward) in self.returns.iter_mut().zip(&self.rewards) {
            *ret += reward;
        }

        self.timestep += 1;
        if !self.terminal && self.timestep >= self.config.horizon {
            debug!(timestep = self.timestep, "horizon reached");
        }
    }

    /// Overwrites the actions of scripted agents with their scripted choice.
    fn update_scripted_agents(&self, actions: &mut [Action]) {
        for agent in self.world.agents() {
            if agent.kind != AgentKind::Scripted {
                continue;
            }
            if let Some(slot) = actions.get_mut(agent.id) {
                *slot = self.scripted_action(agent);
            }
        }
    }

    /// Action a scripted agent takes this turn. Scripted agents carry
    /// `fsm_state`/`route_id` for a future patrol policy; until one exists they
    /// hold their position.
    pub fn scripted_action(&self, _agent: &AgentState) -> Action {
        Action::Stay
    }

    fn check_player(&self, player: usize) -> Result<(), EpisodeError> {
        if player < self.config.num_agents {
            Ok(())
        } else {
            Err(EpisodeError::InvalidPlayer {
                player,
                num_players: self.config.num_agents,
            })
        }
    }

    // Observations. Every player sees the whole grid.

    pub fn observation_string(&self, player: usize) -> Result<String, EpisodeError> {
        self.check_player(player)?;
        Ok(self.to_string())
    }

    pub fn observation_tensor(&self, player: usize) -> Result<Vec<f32>, EpisodeError> {
        self.check_player(player)?;
        Ok(observation::encode(&self.world, player))
    }

    /// Writes the observation of `player` into a caller-owned buffer of
    /// [`observation::tensor_size`] values.
    pub fn write_observation_tensor(
        &self,
        player: usize,
        values: &mut [f32],
    ) -> Result<(), EpisodeError> {
        self.check_player(player)?;
        observation::write_tensor(&self.world, player, values)?;
        Ok(())
    }

    pub fn information_state_string(&self, player: usize) -> Result<String, EpisodeError> {
        self.observation_string(player)
    }

    pub fn information_state_tensor(&self, player: usize) -> Result<Vec<f32>, EpisodeError> {
        self.observation_tensor(player)
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} State:", self.variant.name())?;
        writeln!(f, "Timestep: {}/{}", self.timestep, self.config.horizon)?;
        writeln!(f, "Terminal: {}", self.is_terminal())?;
        let returns: Vec<String> = self.returns.iter().map(|r| r.to_string()).collect();
        writeln!(f, "Returns: [{}]", returns.join(", "))?;
        writeln!(f)?;
        f.write_str(&observation::render(&self.world))
    }
}
