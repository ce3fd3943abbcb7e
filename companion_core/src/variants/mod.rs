//! Objective and layout policies. A variant paints the initial world, decides
//! when an episode is won, and hands out the bonus for winning.

mod goal;
mod synchro;

pub use goal::GoalVariant;
pub use synchro::SynchroVariant;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    Color, Direction, EntityId, Position,
    agent::{AgentKind, AgentState},
    config::GameConfig,
    world::{CellType, World, WorldError},
};

/// Behaviour shared by every variant.
///
/// Variants carry no per-episode state: termination and rewards are read off
/// the world, so a cloned episode never has to resynchronise its variant.
pub trait VariantStrategy {
    /// Name shown in the episode header.
    fn name(&self) -> &'static str;

    /// Lays out cells, agents and walls on an empty world.
    fn setup(&mut self, world: &mut World, config: &GameConfig) -> Result<(), WorldError>;

    fn is_terminal(&self, world: &World, config: &GameConfig) -> bool;

    /// Bonus per player, added on top of the turn reward once terminal.
    fn terminal_rewards(&self, world: &World, config: &GameConfig) -> Vec<f64>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    Goal(GoalVariant),
    Synchro(SynchroVariant),
}

impl Variant {
    pub fn goal() -> Self {
        Variant::Goal(GoalVariant)
    }

    pub fn synchro() -> Self {
        Variant::Synchro(SynchroVariant)
    }
}

impl VariantStrategy for Variant {
    fn name(&self) -> &'static str {
        match self {
            Variant::Goal(v) => v.name(),
            Variant::Synchro(v) => v.name(),
        }
    }

    fn setup(&mut self, world: &mut World, config: &GameConfig) -> Result<(), WorldError> {
        match self {
            Variant::Goal(v) => v.setup(world, config),
            Variant::Synchro(v) => v.setup(world, config),
        }
    }

    fn is_terminal(&self, world: &World, config: &GameConfig) -> bool {
        match self {
            Variant::Goal(v) => v.is_terminal(world, config),
            Variant::Synchro(v) => v.is_terminal(world, config),
        }
    }

    fn terminal_rewards(&self, world: &World, config: &GameConfig) -> Vec<f64> {
        match self {
            Variant::Goal(v) => v.terminal_rewards(world, config),
            Variant::Synchro(v) => v.terminal_rewards(world, config),
        }
    }
}

/// Adds one external agent per start, facing North and colored by id.
///
/// A start that is blocked or already taken falls back to
/// [`World::find_free_cell`], so painted cells count as free.
fn place_agents(
    world: &mut World,
    starts: impl IntoIterator<Item = (EntityId, Position)>,
) -> Result<(), WorldError> {
    for (id, start) in starts {
        let position = if world.is_overlappable(start) {
            start
        } else {
            let fallback = world.find_free_cell().ok_or(WorldError::NoFreeCell(id))?;
            trace!(id, ?start, ?fallback, "start taken, using fallback");
            fallback
        };
        world.add_agent(AgentState::new(
            id,
            position,
            Direction::North,
            Color::PALETTE[id % Color::PALETTE.len()],
            AgentKind::External,
        ))?;
    }
    Ok(())
}

/// Paints a wall, leaving painted cells, agents and off-grid positions alone.
fn place_wall(world: &mut World, pos: Position) -> Result<(), WorldError> {
    if world.cells().get(pos) != Some(&CellType::Empty) || world.agent_at(pos).is_some() {
        return Ok(());
    }
    world.set_cell(pos, CellType::Wall)?;
    Ok(())
}
