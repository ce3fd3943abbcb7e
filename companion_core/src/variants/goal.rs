use serde::{Deserialize, Serialize};

use super::{VariantStrategy, place_agents, place_wall};
use crate::{
    Position,
    config::GameConfig,
    environment::SUCCESS_REWARD,
    world::{CellType, World, WorldError},
};

/// Reach the goal in the top-right corner. The first agent to step on it ends
/// the episode for everyone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalVariant;

impl VariantStrategy for GoalVariant {
    fn name(&self) -> &'static str {
        "CompanionSimple"
    }

    fn setup(&mut self, world: &mut World, config: &GameConfig) -> Result<(), WorldError> {
        let (rows, cols) = (config.rows, config.cols);
        world.set_cell(Position::new(0, cols - 1), CellType::Goal)?;

        // bottom row first, then the rows above it
        let starts = (0..config.num_agents).map(|id| {
            let row = (rows - 1).saturating_sub(id / cols);
            (id, Position::new(row, id % cols))
        });
        place_agents(world, starts)?;

        if rows >= 5 && cols >= 5 {
            let (mid_row, mid_col) = (rows / 2, cols / 2);
            for col in (1..cols - 1).filter(|col| *col != mid_col) {
                place_wall(world, Position::new(mid_row, col))?;
            }
            for row in 1..mid_row {
                place_wall(world, Position::new(row, mid_col))?;
            }
        }
        Ok(())
    }

    fn is_terminal(&self, world: &World, _config: &GameConfig) -> bool {
        world
            .agents()
            .iter()
            .any(|agent| world.cell(agent.position) == CellType::Goal)
    }

    fn terminal_rewards(&self, _world: &World, config: &GameConfig) -> Vec<f64> {
        vec![SUCCESS_REWARD; config.num_agents]
    }
}
