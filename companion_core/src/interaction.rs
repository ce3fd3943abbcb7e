use tracing::debug;

use crate::{environment::Action, world::World};

impl World {
    /// Resolves every `Interact` action, one agent at a time in store order.
    /// Actions are looked up by agent id, as in [`World::predict_moves`].
    ///
    /// An agent facing a door toggles it: a closed door opens if the agent
    /// spends a key of the required color, an open door always closes. An
    /// agent not facing a door picks up the first item lying on its own cell,
    /// if its inventory has room.
    pub fn process_interactions(&mut self, actions: &[Action]) {
        for index in 0..self.agents.len() {
            let agent = &self.agents[index];
            if actions.get(agent.id) != Some(&Action::Interact) {
                continue;
            }
            let here = agent.position;
            let front = agent.facing_cell();
            if !self.in_bounds(front) {
                continue;
            }

            if let Some(door_index) = self.doors.iter().position(|door| door.position == front) {
                let agent = &mut self.agents[index];
                let door = &mut self.doors[door_index];
                if !door.open && agent.has_key(door.required_key) {
                    agent.remove_key(door.required_key);
                    door.open = true;
                    debug!(id = agent.id, ?door.position, ?door.color, "door unlocked");
                } else if door.open {
                    door.open = false;
                    debug!(id = agent.id, ?door.position, "door closed");
                }
                continue;
            }

            if self.agents[index].inventory_full() {
                continue;
            }
            if let Some(item_index) = self
                .ground_items
                .iter()
                .position(|ground| ground.position == here)
            {
                let ground = self.ground_items.remove(item_index);
                let agent = &mut self.agents[index];
                agent.inventory.push(ground.item);
                debug!(id = agent.id, item = ?ground.item, "picked up");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Color, Direction, EntityId, Item, MAX_INVENTORY_SIZE, Position,
        agent::{AgentKind, AgentState},
        world::{Door, GroundItem},
    };

    /// 3x3 world, agent 0 at the center facing `direction`.
    fn world_facing(direction: Direction) -> World {
        let mut world = World::new(3, 3);
        world
            .add_agent(AgentState::new(
                0,
                Position::new(1, 1),
                direction,
                Color::Red,
                AgentKind::External,
            ))
            .unwrap();
        world
    }

    fn inventory(world: &World, id: EntityId) -> &[Item] {
        &world.agent(id).unwrap().inventory
    }

    fn drop_item(world: &mut World, pos: Position, item: Item) {
        world
            .add_ground_item(GroundItem {
                position: pos,
                item,
            })
            .unwrap();
    }

    #[test]
    fn closed_door_stays_closed_without_matching_key() {
        let mut world = world_facing(Direction::North);
        let door_pos = Position::new(0, 1);
        world.add_door(Door::locked(door_pos, Color::Blue)).unwrap();
        world.agent_mut(0).unwrap().inventory.push(Item::key(Color::Red, 1));

        world.process_interactions(&[Action::Interact]);

        assert!(!world.door_at(door_pos).unwrap().open);
        assert_eq!(inventory(&world, 0), &[Item::key(Color::Red, 1)]);
    }

    #[test]
    fn matching_key_opens_door_and_is_consumed_once() {
        let mut world = world_facing(Direction::North);
        let door_pos = Position::new(0, 1);
        world.add_door(Door::locked(door_pos, Color::Blue)).unwrap();
        {
            let agent = world.agent_mut(0).unwrap();
            agent.inventory.push(Item::key(Color::Blue, 1));
            agent.inventory.push(Item::key(Color::Blue, 2));
        }

        world.process_interactions(&[Action::Interact]);

        assert!(world.door_at(door_pos).unwrap().open);
        assert_eq!(inventory(&world, 0), &[Item::key(Color::Blue, 2)]);
    }

    #[test]
    fn open_door_closes_without_a_key() {
        let mut world = world_facing(Direction::East);
        let door_pos = Position::new(1, 2);
        world
            .add_door(Door {
                open: true,
                ..Door::locked(door_pos, Color::Green)
            })
            .unwrap();
        world.agent_mut(0).unwrap().inventory.push(Item::key(Color::Green, 1));

        world.process_interactions(&[Action::Interact]);

        assert!(!world.door_at(door_pos).unwrap().open);
        assert_eq!(inventory(&world, 0).len(), 1);
    }

    #[test]
    fn required_key_color_may_differ_from_door_color() {
        let mut world = world_facing(Direction::South);
        let door_pos = Position::new(2, 1);
        world
            .add_door(Door {
                position: door_pos,
                color: Color::Purple,
                required_key: Color::Cyan,
                open: false,
            })
            .unwrap();
        world.agent_mut(0).unwrap().inventory.push(Item::key(Color::Purple, 1));
        world.process_interactions(&[Action::Interact]);
        assert!(!world.door_at(door_pos).unwrap().open);

        world.agent_mut(0).unwrap().inventory.push(Item::key(Color::Cyan, 2));
        world.process_interactions(&[Action::Interact]);
        assert!(world.door_at(door_pos).unwrap().open);
        assert_eq!(inventory(&world, 0), &[Item::key(Color::Purple, 1)]);
    }

    #[test]
    fn facing_a_door_suppresses_pickup() {
        let mut world = world_facing(Direction::North);
        world
            .add_door(Door::locked(Position::new(0, 1), Color::Blue))
            .unwrap();
        drop_item(&mut world, Position::new(1, 1), Item::treasure(Color::Red, 5));

        world.process_interactions(&[Action::Interact]);

        assert!(inventory(&world, 0).is_empty());
        assert_eq!(world.ground_items().len(), 1);
    }

    #[test]
    fn pickup_takes_one_item_from_own_cell() {
        let mut world = world_facing(Direction::North);
        drop_item(&mut world, Position::new(1, 1), Item::treasure(Color::Red, 5));
        drop_item(&mut world, Position::new(1, 1), Item::key(Color::Blue, 6));
        drop_item(&mut world, Position::new(0, 1), Item::key(Color::Green, 7));

        world.process_interactions(&[Action::Interact]);
        assert_eq!(inventory(&world, 0), &[Item::treasure(Color::Red, 5)]);
        assert_eq!(world.ground_items().len(), 2);

        world.process_interactions(&[Action::Interact]);
        world.process_interactions(&[Action::Interact]);
        assert_eq!(inventory(&world, 0).len(), 2);
        assert_eq!(world.ground_items_at(Position::new(0, 1)).count(), 1);
    }

    #[test]
    fn full_inventory_leaves_item_on_the_ground() {
        let mut world = world_facing(Direction::North);
        for id in 0..MAX_INVENTORY_SIZE {
            world.agent_mut(0).unwrap().inventory.push(Item::treasure(Color::Red, id));
        }
        drop_item(&mut world, Position::new(1, 1), Item::key(Color::Blue, 99));

        world.process_interactions(&[Action::Interact]);

        assert_eq!(inventory(&world, 0).len(), MAX_INVENTORY_SIZE);
        assert_eq!(world.ground_items().len(), 1);
    }

    #[test]
    fn facing_off_the_grid_does_nothing() {
        let mut world = World::new(1, 1);
        world
            .add_agent(AgentState::new(
                0,
                Position::new(0, 0),
                Direction::West,
                Color::Red,
                AgentKind::External,
            ))
            .unwrap();
        drop_item(&mut world, Position::new(0, 0), Item::treasure(Color::Red, 1));

        world.process_interactions(&[Action::Interact]);

        assert!(inventory(&world, 0).is_empty());
    }

    #[test]
    fn only_interact_actions_are_processed() {
        let mut world = world_facing(Direction::North);
        drop_item(&mut world, Position::new(1, 1), Item::treasure(Color::Red, 1));
        world.process_interactions(&[Action::Stay]);
        world.process_interactions(&[]);
        assert!(inventory(&world, 0).is_empty());
    }
}
