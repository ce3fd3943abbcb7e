use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    Color, EntityId, Item, Position,
    agent::AgentState,
    map::{Grid, GridError},
};

/// Represents the static type of a cell in the world grid.
///
/// The discriminants are the observation plane indices of the cell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Empty = 0,
    Wall = 1,
    /// Walkable, but kills whoever ends a turn on it.
    Lava = 2,
    Goal = 3,
    Synchro = 4,
}

impl CellType {
    pub const COUNT: usize = 5;

    pub fn glyph(self) -> char {
        match self {
            CellType::Empty => '.',
            CellType::Wall => '#',
            CellType::Lava => '~',
            CellType::Goal => 'G',
            CellType::Synchro => 'S',
        }
    }
}

/// A door occupying a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub position: Position,
    pub color: Color,
    pub required_key: Color,
    pub open: bool,
}

impl Door {
    /// A closed door opened by a key of its own color.
    pub fn locked(position: Position, color: Color) -> Self {
        Door {
            position,
            color,
            required_key: color,
            open: false,
        }
    }
}

/// An item lying on the ground, waiting to be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundItem {
    pub position: Position,
    pub item: Item,
}

/// Represents errors raised while populating the world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("Agent with ID {0} already exists")]
    DuplicateAgent(EntityId),
    #[error("Cannot place agent {id} inside a wall at ({}, {})", .position.row, .position.col)]
    AgentInWall { id: EntityId, position: Position },
    #[error("A door already occupies ({}, {})", .0.row, .0.col)]
    DoorOccupied(Position),
    #[error("No free cell left to place agent {0}")]
    NoFreeCell(EntityId),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Owns every piece of positional state: the static cell map plus the agents,
/// doors and ground items living on it.
///
/// Agents are kept in insertion order and addressed by their stable id, so an
/// agent's id keeps naming the same player after other agents are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub(crate) cells: Grid<CellType>,
    pub(crate) agents: Vec<AgentState>,
    pub(crate) doors: Vec<Door>,
    pub(crate) ground_items: Vec<GroundItem>,
}

impl World {
    /// Creates an all-`Empty` world with no actors.
    pub fn new(rows: usize, cols: usize) -> Self {
        World {
            cells: Grid::new(rows, cols),
            agents: Vec::new(),
            doors: Vec::new(),
            ground_items: Vec::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn cells(&self) -> &Grid<CellType> {
        &self.cells
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        self.cells.in_bounds(pos)
    }

    /// Cell type at `pos`. Bounds are only checked in debug builds.
    #[inline]
    pub fn cell(&self, pos: Position) -> CellType {
        self.cells[pos]
    }

    /// Paints the cell at `pos`.
    pub fn set_cell(&mut self, pos: Position, cell: CellType) -> Result<(), GridError> {
        self.cells.set(pos, cell)
    }

    // Agents

    /// Adds an agent. Its id must not be in use.
    pub fn add_agent(&mut self, agent: AgentState) -> Result<(), WorldError> {
        if self.agent(agent.id).is_some() {
            return Err(WorldError::DuplicateAgent(agent.id));
        }
        match self.cells.get(agent.position) {
            None => {
                return Err(GridError::OutOfBounds {
                    row: agent.position.row,
                    col: agent.position.col,
                    rows: self.rows(),
                    cols: self.cols(),
                }
                .into());
            }
            Some(CellType::Wall) => {
                return Err(WorldError::AgentInWall {
                    id: agent.id,
                    position: agent.position,
                });
            }
            Some(_) => {}
        }
        trace!(id = agent.id, ?agent.position, "agent added");
        self.agents.push(agent);
        Ok(())
    }

    /// Removes the agent with `id`, returning it if it was present.
    pub fn remove_agent(&mut self, id: EntityId) -> Option<AgentState> {
        let index = self.agent_index(id)?;
        Some(self.agents.remove(index))
    }

    pub fn agent(&self, id: EntityId) -> Option<&AgentState> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut AgentState> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }

    /// All agents still on the grid, in insertion order.
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// First agent standing on `pos`.
    pub fn agent_at(&self, pos: Position) -> Option<&AgentState> {
        self.agents.iter().find(|agent| agent.position == pos)
    }

    /// Ids of every agent standing on `pos`.
    pub fn agent_ids_at(&self, pos: Position) -> Vec<EntityId> {
        self.agents
            .iter()
            .filter(|agent| agent.position == pos)
            .map(|agent| agent.id)
            .collect()
    }

    fn agent_index(&self, id: EntityId) -> Option<usize> {
        self.agents.iter().position(|agent| agent.id == id)
    }

    // Doors

    pub fn add_door(&mut self, door: Door) -> Result<(), WorldError> {
        if !self.in_bounds(door.position) {
            return Err(GridError::OutOfBounds {
                row: door.position.row,
                col: door.position.col,
                rows: self.rows(),
                cols: self.cols(),
            }
            .into());
        }
        if self.door_at(door.position).is_some() {
            return Err(WorldError::DoorOccupied(door.position));
        }
        self.doors.push(door);
        Ok(())
    }

    pub fn remove_door(&mut self, pos: Position) -> Option<Door> {
        let index = self.doors.iter().position(|door| door.position == pos)?;
        Some(self.doors.remove(index))
    }

    pub fn door_at(&self, pos: Position) -> Option<&Door> {
        self.doors.iter().find(|door| door.position == pos)
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    // Ground items

    pub fn add_ground_item(&mut self, item: GroundItem) -> Result<(), WorldError> {
        if !self.in_bounds(item.position) {
            return Err(GridError::OutOfBounds {
                row: item.position.row,
                col: item.position.col,
                rows: self.rows(),
                cols: self.cols(),
            }
            .into());
        }
        self.ground_items.push(item);
        Ok(())
    }

    /// Removes the item with `item_id` lying on `pos`.
    pub fn remove_ground_item(&mut self, pos: Position, item_id: usize) -> Option<GroundItem> {
        let index = self
            .ground_items
            .iter()
            .position(|ground| ground.position == pos && ground.item.id == item_id)?;
        Some(self.ground_items.remove(index))
    }

    /// Items lying on `pos`, oldest first.
    pub fn ground_items_at(&self, pos: Position) -> impl Iterator<Item = &GroundItem> {
        self.ground_items
            .iter()
            .filter(move |ground| ground.position == pos)
    }

    pub fn ground_items(&self) -> &[GroundItem] {
        &self.ground_items
    }

    // Movement queries

    /// Whether a mover may enter `pos` this turn.
    ///
    /// Walls, closed doors and out-of-bounds cells block. Other agents do not;
    /// agent/agent conflicts are settled by collision resolution.
    pub fn can_move_to(&self, pos: Position) -> bool {
        match self.cells.get(pos) {
            None | Some(CellType::Wall) => false,
            Some(_) => !self.door_at(pos).is_some_and(|door| !door.open),
        }
    }

    /// Like [`World::can_move_to`] but also refuses cells that hold an agent.
    /// Used when placing actors, never during turn resolution.
    pub fn is_overlappable(&self, pos: Position) -> bool {
        self.can_move_to(pos) && self.agent_at(pos).is_none()
    }

    /// First cell in row-major order that an agent may be placed on: overlappable
    /// and not lava. `None` only when every such cell is taken.
    pub fn find_free_cell(&self) -> Option<Position> {
        self.cells
            .positions()
            .find(|pos| self.is_overlappable(*pos) && self.cell(*pos) != CellType::Lava)
    }

    // Death

    /// Ids of agents currently standing on lava.
    pub fn dead_agents(&self) -> Vec<EntityId> {
        self.agents
            .iter()
            .filter(|agent| self.cell(agent.position) == CellType::Lava)
            .map(|agent| agent.id)
            .collect()
    }

    /// Removes every agent standing on lava and returns their ids.
    pub fn remove_dead_agents(&mut self) -> Vec<EntityId> {
        let dead = self.dead_agents();
        let cells = &self.cells;
        self.agents
            .retain(|agent| cells[agent.position] != CellType::Lava);
        dead
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::observation::render(self))
    }
}
