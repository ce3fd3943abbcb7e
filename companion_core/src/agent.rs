use serde::{Deserialize, Serialize};

use crate::{Color, Direction, EntityId, Item, ItemKind, MAX_INVENTORY_SIZE, Position};

/// Who decides an agent's action each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentKind {
    /// Action is supplied by the caller (learner, search, human).
    #[default]
    External,
    /// Action is chosen by the engine's scripted-agent hook.
    Scripted,
}

/// Holds the state of an agent within the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: EntityId,
    pub position: Position,
    pub direction: Direction,
    pub color: Color,
    pub kind: AgentKind,
    pub inventory: Vec<Item>,
    /// Scripted-control placeholders. Unused until scripted agents get a policy.
    pub fsm_state: u32,
    pub route_id: u32,
}

impl AgentState {
    pub fn new(
        id: EntityId,
        position: Position,
        direction: Direction,
        color: Color,
        kind: AgentKind,
    ) -> Self {
        AgentState {
            id,
            position,
            direction,
            color,
            kind,
            inventory: Vec::with_capacity(4),
            fsm_state: 0,
            route_id: 0,
        }
    }

    /// Whether the agent carries a key of `color`.
    pub fn has_key(&self, color: Color) -> bool {
        self.inventory.iter().any(|item| item.is_key_of(color))
    }

    /// Removes one key of `color`. Returns `false` when no such key is held.
    pub fn remove_key(&mut self, color: Color) -> bool {
        match self.inventory.iter().position(|item| item.is_key_of(color)) {
            Some(index) => {
                self.inventory.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn inventory_full(&self) -> bool {
        self.inventory.len() >= MAX_INVENTORY_SIZE
    }

    pub fn count_of(&self, kind: ItemKind) -> usize {
        self.inventory.iter().filter(|item| item.kind == kind).count()
    }

    /// The cell directly in front of the agent. May be out of bounds.
    pub fn facing_cell(&self) -> Position {
        self.position.neighbor(self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> AgentState {
        AgentState::new(
            0,
            Position::new(1, 1),
            Direction::North,
            Color::Red,
            AgentKind::External,
        )
    }

    #[test]
    fn remove_key_takes_exactly_one_matching_key() {
        let mut agent = agent();
        agent.inventory.push(Item::treasure(Color::Blue, 0));
        agent.inventory.push(Item::key(Color::Blue, 1));
        agent.inventory.push(Item::key(Color::Blue, 2));

        assert!(agent.has_key(Color::Blue));
        assert!(!agent.has_key(Color::Red));
        assert!(agent.remove_key(Color::Blue));
        assert_eq!(agent.inventory.len(), 2);
        assert_eq!(agent.count_of(ItemKind::Key), 1);
        assert_eq!(agent.inventory[1].id, 2);
        assert!(!agent.remove_key(Color::Red));
    }

    #[test]
    fn treasure_of_matching_color_is_not_a_key() {
        let mut agent = agent();
        agent.inventory.push(Item::treasure(Color::Green, 0));
        assert!(!agent.has_key(Color::Green));
        assert!(!agent.remove_key(Color::Green));
    }

    #[test]
    fn facing_cell_follows_direction() {
        let mut agent = agent();
        assert_eq!(agent.facing_cell(), Position::new(0, 1));
        agent.direction = Direction::East;
        assert_eq!(agent.facing_cell(), Position::new(1, 2));
    }
}
