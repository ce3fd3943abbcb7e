use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{VariantStrategy, place_agents, place_wall};
use crate::{
    Position,
    config::GameConfig,
    environment::SUCCESS_REWARD,
    world::{CellType, World, WorldError},
};

/// Every agent has to stand on its own synchro cell at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynchroVariant;

impl SynchroVariant {
    /// Where the synchro cells go for a given team size.
    pub fn synchro_cells(rows: usize, cols: usize, num_agents: usize) -> Vec<Position> {
        let (last_row, last_col) = (rows - 1, cols - 1);
        match num_agents {
            1 => vec![Position::new(rows / 2, cols / 2)],
            2 => vec![Position::new(0, 0), Position::new(last_row, last_col)],
            3 => vec![
                Position::new(0, cols / 2),
                Position::new(last_row, 0),
                Position::new(last_row, last_col),
            ],
            4 => vec![
                Position::new(0, 0),
                Position::new(0, last_col),
                Position::new(last_row, 0),
                Position::new(last_row, last_col),
            ],
            n => (0..n).map(|i| perimeter_cell(rows, cols, i)).collect(),
        }
    }
}

/// The `i`-th cell walking clockwise around the border from the top-left
/// corner. The bottom-right corner is visited twice, and the walk is clamped
/// onto the grid once it runs past its start.
fn perimeter_cell(rows: usize, cols: usize, i: usize) -> Position {
    let (rows, cols, i) = (rows as isize, cols as isize, i as isize);
    let (row, col) = if i < cols {
        (0, i)
    } else if i < cols + rows - 1 {
        (i - cols + 1, cols - 1)
    } else if i < 2 * cols + rows - 2 {
        (rows - 1, cols - 1 - (i - cols - rows + 1))
    } else {
        (rows - 1 - (i - 2 * cols - rows + 2), 0)
    };
    Position::new(
        row.clamp(0, rows - 1) as usize,
        col.clamp(0, cols - 1) as usize,
    )
}

/// Start of agent `id`: the center, then the cells around it.
fn start_cell(rows: usize, cols: usize, id: usize) -> Position {
    let row_offset = match (id % 2, id % 4) {
        (0, _) => 0,
        (_, 0 | 1) => -1,
        _ => 1,
    };
    let col_offset = match ((id / 2) % 2, id / 4) {
        (0, _) => 0,
        (_, 0 | 1) => -1,
        _ => 1,
    };
    let clamp = |center: usize, offset: isize, len: usize| {
        center.saturating_add_signed(offset).min(len - 1)
    };
    Position::new(
        clamp(rows / 2, row_offset, rows),
        clamp(cols / 2, col_offset, cols),
    )
}

impl VariantStrategy for SynchroVariant {
    fn name(&self) -> &'static str {
        "CompanionSynchro"
    }

    fn setup(&mut self, world: &mut World, config: &GameConfig) -> Result<(), WorldError> {
        let (rows, cols) = (config.rows, config.cols);
        for pos in Self::synchro_cells(rows, cols, config.num_agents) {
            world.set_cell(pos, CellType::Synchro)?;
        }

        let starts = (0..config.num_agents).map(|id| (id, start_cell(rows, cols, id)));
        place_agents(world, starts)?;

        // a cross of double walls with a gap through the middle
        if rows >= 6 && cols >= 6 {
            let (mid_row, mid_col) = (rows / 2, cols / 2);
            for col in (1..cols - 1).filter(|col| *col != mid_col) {
                place_wall(world, Position::new(mid_row - 1, col))?;
                place_wall(world, Position::new(mid_row + 1, col))?;
            }
            for row in (1..rows - 1).filter(|row| *row != mid_row) {
                place_wall(world, Position::new(row, mid_col - 1))?;
                place_wall(world, Position::new(row, mid_col + 1))?;
            }
        }
        Ok(())
    }

    fn is_terminal(&self, world: &World, config: &GameConfig) -> bool {
        let occupied: HashSet<Position> = world
            .agents()
            .iter()
            .map(|agent| agent.position)
            .filter(|pos| world.cell(*pos) == CellType::Synchro)
            .collect();
        occupied.len() == config.num_agents
    }

    fn terminal_rewards(&self, _world: &World, config: &GameConfig) -> Vec<f64> {
        vec![SUCCESS_REWARD; config.num_agents]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rows: usize, cols: usize, num_agents: usize) -> GameConfig {
        GameConfig {
            rows,
            cols,
            horizon: 10,
            num_agents,
        }
    }

    fn layout(config: &GameConfig) -> World {
        let mut world = World::new(config.rows, config.cols);
        SynchroVariant.setup(&mut world, config).unwrap();
        world
    }

    #[test]
    fn synchro_cells_by_team_size() {
        let p = Position::new;
        assert_eq!(SynchroVariant::synchro_cells(5, 7, 1), vec![p(2, 3)]);
        assert_eq!(SynchroVariant::synchro_cells(5, 7, 2), vec![p(0, 0), p(4, 6)]);
        assert_eq!(
            SynchroVariant::synchro_cells(5, 7, 3),
            vec![p(0, 3), p(4, 0), p(4, 6)]
        );
        assert_eq!(
            SynchroVariant::synchro_cells(5, 7, 4),
            vec![p(0, 0), p(0, 6), p(4, 0), p(4, 6)]
        );
        assert_eq!(
            SynchroVariant::synchro_cells(3, 3, 9),
            vec![
                p(0, 0),
                p(0, 1),
                p(0, 2),
                p(1, 2),
                p(2, 2),
                p(2, 2),
                p(2, 1),
                p(2, 0),
                p(1, 0),
            ]
        );
    }

    #[test]
    fn agents_start_around_the_center() {
        let world = layout(&config(7, 7, 4));
        let starts: Vec<_> = world.agents().iter().map(|a| a.position).collect();
        assert_eq!(
            starts,
            vec![
                Position::new(3, 3),
                Position::new(2, 3),
                Position::new(3, 2),
                Position::new(4, 2),
            ]
        );
    }

    #[test]
    fn repeated_start_falls_back_to_a_free_cell() {
        // agent 4 maps back onto the center, which agent 0 holds, and lands
        // on the first synchro cell instead
        let world = layout(&config(8, 8, 5));
        assert_eq!(world.agent(4).unwrap().position, Position::new(0, 0));
        assert_eq!(world.cell(Position::new(0, 0)), CellType::Synchro);
    }

    #[test]
    fn default_board_layout() {
        let world = layout(&config(8, 8, 2));
        assert_eq!(
            world.to_string(),
            "\
S.......
...#.#..
...#.#..
.###^##.
....^...
.###.##.
...#.#..
.......S
"
        );
    }

    #[test]
    fn terminal_when_every_synchro_cell_is_held() {
        let config = config(3, 3, 2);
        let mut world = layout(&config);
        assert!(!SynchroVariant.is_terminal(&world, &config));

        world.agent_mut(0).unwrap().position = Position::new(0, 0);
        world.agent_mut(1).unwrap().position = Position::new(0, 0);
        assert!(!SynchroVariant.is_terminal(&world, &config));

        world.agent_mut(1).unwrap().position = Position::new(2, 2);
        assert!(SynchroVariant.is_terminal(&world, &config));
        assert_eq!(
            SynchroVariant.terminal_rewards(&world, &config),
            vec![SUCCESS_REWARD; 2]
        );
    }
}
