//! Fixed-shape tensor and text views of a [`World`].
//!
//! The tensor is laid out plane-major, then row-major: value
//! `plane * rows * cols + row * cols + col`. Planes:
//!
//! | plane | content                                   |
//! |-------|-------------------------------------------|
//! | 0..=4 | one-hot cell type (Empty, Wall, Lava, Goal, Synchro) |
//! | 5     | any agent                                 |
//! | 6     | the observing player's own agent          |
//! | 7     | closed doors                              |
//! | 8     | open doors                                |
//! | 9     | cells holding at least one ground item    |

use crate::{
    EntityId, Position,
    world::{CellType, World},
};

pub const NUM_PLANES: usize = 10;
/// First plane after the cell-type planes.
pub const AGENT_PLANE: usize = CellType::COUNT;
pub const SELF_PLANE: usize = 6;
pub const CLOSED_DOOR_PLANE: usize = 7;
pub const OPEN_DOOR_PLANE: usize = 8;
pub const ITEM_PLANE: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Observation buffer holds {actual} values but {expected} are required")]
pub struct TensorSizeError {
    pub expected: usize,
    pub actual: usize,
}

/// `[planes, rows, cols]`.
pub fn tensor_shape(rows: usize, cols: usize) -> [usize; 3] {
    [NUM_PLANES, rows, cols]
}

pub fn tensor_size(rows: usize, cols: usize) -> usize {
    NUM_PLANES * rows * cols
}

/// Encodes the world as seen by `player` into a freshly allocated tensor.
pub fn encode(world: &World, player: EntityId) -> Vec<f32> {
    let mut values = vec![0.0; tensor_size(world.rows(), world.cols())];
    fill(world, player, &mut values);
    values
}

/// Encodes the world as seen by `player` into `values`, overwriting it.
pub fn write_tensor(
    world: &World,
    player: EntityId,
    values: &mut [f32],
) -> Result<(), TensorSizeError> {
    let expected = tensor_size(world.rows(), world.cols());
    if values.len() != expected {
        return Err(TensorSizeError {
            expected,
            actual: values.len(),
        });
    }
    values.fill(0.0);
    fill(world, player, values);
    Ok(())
}

fn fill(world: &World, player: EntityId, values: &mut [f32]) {
    let (rows, cols) = (world.rows(), world.cols());
    let mut mark = |plane: usize, pos: Position| {
        values[plane * rows * cols + pos.row * cols + pos.col] = 1.0;
    };

    for (pos, cell) in world.cells().enumerate() {
        mark(*cell as usize, pos);
    }
    for agent in world.agents() {
        mark(AGENT_PLANE, agent.position);
    }
    if let Some(agent) = world.agent(player) {
        mark(SELF_PLANE, agent.position);
    }
    for door in world.doors() {
        let plane = if door.open {
            OPEN_DOOR_PLANE
        } else {
            CLOSED_DOOR_PLANE
        };
        mark(plane, door.position);
    }
    for ground in world.ground_items() {
        mark(ITEM_PLANE, ground.position);
    }
}

/// Draws one character per cell, one line per row.
///
/// Agents (by facing) win over doors (`/` open, `+` closed), which win over
/// items (`*`), which win over the cell type.
pub fn render(world: &World) -> String {
    let mut out = String::with_capacity((world.cols() + 1) * world.rows());
    for row in 0..world.rows() {
        for col in 0..world.cols() {
            let pos = Position::new(row, col);
            let glyph = if let Some(agent) = world.agent_at(pos) {
                agent.direction.glyph()
            } else if let Some(door) = world.door_at(pos) {
                if door.open { '/' } else { '+' }
            } else if world.ground_items_at(pos).next().is_some() {
                '*'
            } else {
                world.cell(pos).glyph()
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}
