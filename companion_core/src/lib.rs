use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod environment;
pub mod game;
pub mod interaction;
pub mod map;
pub mod movement;
pub mod observation;
pub mod policy;
pub mod registry;
pub mod variants;
pub mod world;

/// Unique identifier for agents. Doubles as the player index.
pub type EntityId = usize;

/// Number of distinct actions: four moves, interact and stay.
pub const NUM_ACTIONS: usize = 6;
/// Upper bound on agents in a single episode.
pub const MAX_AGENTS: usize = 25;
/// Items an agent can carry at once.
pub const MAX_INVENTORY_SIZE: usize = 8;

/// Represents a grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns the adjacent position in `direction`.
    ///
    /// Stepping off the top or left edge wraps to a huge coordinate, which every
    /// bounds check rejects, so callers only ever need one bounds test.
    #[inline]
    pub fn neighbor(self, direction: Direction) -> Position {
        let (dr, dc) = direction.delta();
        Position {
            row: self.row.wrapping_add_signed(dr),
            col: self.col.wrapping_add_signed(dc),
        }
    }
}

/// Cardinal facing / movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// (row, col) delta.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::West => (0, -1),
        }
    }

    /// Glyph used when rendering an agent facing this way.
    pub fn glyph(self) -> char {
        match self {
            Direction::North => '^',
            Direction::East => '>',
            Direction::South => 'v',
            Direction::West => '<',
        }
    }
}

/// Colors used for agents, doors and keys. Key/door matching compares colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Cyan,
    Pink,
}

impl Color {
    /// Palette agents are colored from, in player order.
    pub const PALETTE: [Color; 8] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
        Color::Cyan,
        Color::Pink,
    ];
}

/// Kinds of pickable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Key,
    Treasure,
}

/// Represents items that can lie on the ground or sit in an agent's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub color: Color,
    pub id: usize,
}

impl Item {
    pub fn key(color: Color, id: usize) -> Self {
        Item {
            kind: ItemKind::Key,
            color,
            id,
        }
    }

    pub fn treasure(color: Color, id: usize) -> Self {
        Item {
            kind: ItemKind::Treasure,
            color,
            id,
        }
    }

    pub fn is_key_of(&self, color: Color) -> bool {
        self.kind == ItemKind::Key && self.color == color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_off_the_top_edge_is_far_out_of_range() {
        let origin = Position::new(0, 0);
        assert!(origin.neighbor(Direction::North).row > 1_000_000);
        assert!(origin.neighbor(Direction::West).col > 1_000_000);
        assert_eq!(origin.neighbor(Direction::South), Position::new(1, 0));
        assert_eq!(origin.neighbor(Direction::East), Position::new(0, 1));
    }
}
