//! Simultaneous movement: predict every agent's destination, settle conflicts,
//! then write the surviving positions back in one go.

use tracing::{debug, trace};

use crate::{EntityId, Position, environment::Action, world::World};

/// An agent's intended (later: final) destination for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub agent_id: EntityId,
    pub destination: Position,
}

impl World {
    /// Pairs every agent with the action at its player index and computes where
    /// it wants to go. Agents without an action are skipped.
    ///
    /// `actions[i]` belongs to the agent with id `i`, not to the i-th stored
    /// agent, so a removed agent never shifts the actions of the others.
    ///
    /// Cardinal actions target the neighbouring cell, which may be off the grid;
    /// `Interact` and `Stay` target the agent's own cell.
    pub fn predict_moves(&self, actions: &[Action]) -> Vec<Move> {
        self.agents
            .iter()
            .filter_map(|agent| {
                let action = actions.get(agent.id)?;
                let destination = match action.direction() {
                    Some(direction) => agent.position.neighbor(direction),
                    None => agent.position,
                };
                Some(Move {
                    agent_id: agent.id,
                    destination,
                })
            })
            .collect()
    }

    /// Turns predicted moves into a legal set of final positions.
    ///
    /// First every move into a blocked cell is cancelled. Then each pair of
    /// moves sharing a destination is settled: if both agents moved they both
    /// stay put, otherwise only the one that moved stays put. The check is
    /// strictly pairwise, so rotations and swaps go through.
    pub fn resolve_collisions(&self, moves: &mut [Move]) {
        for mv in moves.iter_mut() {
            let Some(agent) = self.agent(mv.agent_id) else {
                continue;
            };
            if !self.can_move_to(mv.destination) {
                trace!(id = mv.agent_id, ?mv.destination, "move blocked");
                mv.destination = agent.position;
            }
        }

        for i in 0..moves.len() {
            for j in (i + 1)..moves.len() {
                if moves[i].destination != moves[j].destination {
                    continue;
                }
                let (Some(first), Some(second)) =
                    (self.agent(moves[i].agent_id), self.agent(moves[j].agent_id))
                else {
                    continue;
                };
                let first_moved = moves[i].destination != first.position;
                let second_moved = moves[j].destination != second.position;

                if first_moved {
                    moves[i].destination = first.position;
                }
                if second_moved {
                    moves[j].destination = second.position;
                }
                if first_moved || second_moved {
                    debug!(
                        first = first.id,
                        second = second.id,
                        double = first_moved && second_moved,
                        "collision, bounced back"
                    );
                }
            }
        }
    }

    /// Writes final positions by agent id. Agents not listed are untouched.
    pub fn apply_moves(&mut self, moves: &[Move]) {
        for mv in moves {
            if let Some(agent) = self.agent_mut(mv.agent_id) {
                agent.position = mv.destination;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Color, Direction,
        agent::{AgentKind, AgentState},
        world::{CellType, Door},
    };

    fn world_with(rows: usize, cols: usize, agents: &[(usize, usize)]) -> World {
        let mut world = World::new(rows, cols);
        for (id, &(row, col)) in agents.iter().enumerate() {
            world
                .add_agent(AgentState::new(
                    id,
                    Position::new(row, col),
                    Direction::North,
                    Color::PALETTE[id % 8],
                    AgentKind::External,
                ))
                .unwrap();
        }
        world
    }

    fn step(world: &mut World, actions: &[Action]) {
        let mut moves = world.predict_moves(actions);
        world.resolve_collisions(&mut moves);
        world.apply_moves(&moves);
    }

    fn position(world: &World, id: EntityId) -> Position {
        world.agent(id).unwrap().position
    }

    #[test]
    fn predict_uses_neighbour_for_moves_and_own_cell_otherwise() {
        let world = world_with(3, 3, &[(1, 1), (0, 0), (2, 2)]);
        let moves = world.predict_moves(&[Action::East, Action::Interact, Action::Stay]);
        assert_eq!(
            moves,
            vec![
                Move {
                    agent_id: 0,
                    destination: Position::new(1, 2)
                },
                Move {
                    agent_id: 1,
                    destination: Position::new(0, 0)
                },
                Move {
                    agent_id: 2,
                    destination: Position::new(2, 2)
                },
            ]
        );
    }

    #[test]
    fn predict_skips_agents_without_an_action() {
        let world = world_with(3, 3, &[(1, 1), (0, 0)]);
        let moves = world.predict_moves(&[Action::South]);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].agent_id, 0);
    }

    #[test]
    fn predict_pairs_actions_by_agent_id_after_removal() {
        let mut world = world_with(3, 3, &[(0, 0), (1, 1)]);
        world.remove_agent(0);
        let moves = world.predict_moves(&[Action::East, Action::South]);
        assert_eq!(
            moves,
            vec![Move {
                agent_id: 1,
                destination: Position::new(2, 1)
            }]
        );
    }

    #[test]
    fn blocked_destinations_revert() {
        let mut world = world_with(3, 3, &[(1, 1), (0, 0), (2, 2)]);
        world.set_cell(Position::new(0, 1), CellType::Wall).unwrap();
        world
            .add_door(Door::locked(Position::new(2, 1), Color::Red))
            .unwrap();

        step(&mut world, &[Action::North, Action::North, Action::West]);

        assert_eq!(position(&world, 0), Position::new(1, 1));
        assert_eq!(position(&world, 1), Position::new(0, 0));
        assert_eq!(position(&world, 2), Position::new(2, 2));
    }

    #[test]
    fn open_doors_and_lava_are_enterable() {
        let mut world = world_with(1, 3, &[(0, 1)]);
        world
            .add_door(Door {
                open: true,
                ..Door::locked(Position::new(0, 2), Color::Red)
            })
            .unwrap();
        world.set_cell(Position::new(0, 0), CellType::Lava).unwrap();

        step(&mut world, &[Action::East]);
        assert_eq!(position(&world, 0), Position::new(0, 2));
        step(&mut world, &[Action::West]);
        step(&mut world, &[Action::West]);
        assert_eq!(position(&world, 0), Position::new(0, 0));
    }

    #[test]
    fn two_movers_into_one_cell_both_bounce() {
        let mut world = world_with(3, 3, &[(1, 0), (1, 2)]);
        step(&mut world, &[Action::East, Action::West]);
        assert_eq!(position(&world, 0), Position::new(1, 0));
        assert_eq!(position(&world, 1), Position::new(1, 2));
    }

    #[test]
    fn mover_into_stationary_agent_bounces_alone() {
        let mut world = world_with(1, 3, &[(0, 0), (0, 1)]);
        step(&mut world, &[Action::East, Action::Stay]);
        assert_eq!(position(&world, 0), Position::new(0, 0));
        assert_eq!(position(&world, 1), Position::new(0, 1));
    }

    #[test]
    fn mover_blocked_by_wall_then_bumped_by_agent_stays() {
        // Agent 0 walks into a wall and reverts to its own cell, which agent 1
        // is trying to enter. Only agent 1 moved, so only agent 1 bounces.
        let mut world = world_with(1, 3, &[(0, 1), (0, 0)]);
        world.set_cell(Position::new(0, 2), CellType::Wall).unwrap();
        step(&mut world, &[Action::East, Action::East]);
        assert_eq!(position(&world, 0), Position::new(0, 1));
        assert_eq!(position(&world, 1), Position::new(0, 0));
    }

    #[test]
    fn following_into_a_vacated_cell_succeeds() {
        let mut world = world_with(1, 3, &[(0, 1), (0, 0)]);
        step(&mut world, &[Action::East, Action::East]);
        assert_eq!(position(&world, 0), Position::new(0, 2));
        assert_eq!(position(&world, 1), Position::new(0, 1));
    }

    #[test]
    fn rotation_cycles_complete() {
        // 2x2 square, every agent moves clockwise into the next one's cell.
        let mut world = world_with(2, 2, &[(0, 0), (0, 1), (1, 1), (1, 0)]);
        step(
            &mut world,
            &[Action::East, Action::South, Action::West, Action::North],
        );
        assert_eq!(position(&world, 0), Position::new(0, 1));
        assert_eq!(position(&world, 1), Position::new(1, 1));
        assert_eq!(position(&world, 2), Position::new(1, 0));
        assert_eq!(position(&world, 3), Position::new(0, 0));
    }

    #[test]
    fn bounce_does_not_reach_back_along_a_chain() {
        // Agent 1 bounces off the stationary agent 2, but agent 0 was already
        // compared with agent 1 and keeps its move, so 0 and 1 share a cell.
        let mut world = world_with(1, 4, &[(0, 0), (0, 1), (0, 2)]);
        step(&mut world, &[Action::East, Action::East, Action::Stay]);
        assert_eq!(position(&world, 0), Position::new(0, 1));
        assert_eq!(position(&world, 1), Position::new(0, 1));
        assert_eq!(position(&world, 2), Position::new(0, 2));
        assert_eq!(world.agent_ids_at(Position::new(0, 1)), vec![0, 1]);
        assert_eq!(world.to_string(), ".^^.\n");
    }

    #[test]
    fn head_on_swap_passes_through() {
        let mut world = world_with(1, 2, &[(0, 0), (0, 1)]);
        step(&mut world, &[Action::East, Action::West]);
        assert_eq!(position(&world, 0), Position::new(0, 1));
        assert_eq!(position(&world, 1), Position::new(0, 0));
    }

    #[test]
    fn third_claimant_is_only_checked_pairwise() {
        // Agents 0 and 1 bounce off each other first; by the time agent 2 is
        // compared, their destinations are their own cells, so agent 2 enters.
        let mut world = world_with(3, 3, &[(1, 0), (1, 2), (0, 1)]);
        step(&mut world, &[Action::East, Action::West, Action::South]);
        assert_eq!(position(&world, 0), Position::new(1, 0));
        assert_eq!(position(&world, 1), Position::new(1, 2));
        assert_eq!(position(&world, 2), Position::new(1, 1));
    }

    #[test]
    fn apply_ignores_unknown_agents() {
        let mut world = world_with(2, 2, &[(0, 0)]);
        world.apply_moves(&[Move {
            agent_id: 7,
            destination: Position::new(1, 1),
        }]);
        assert_eq!(position(&world, 0), Position::new(0, 0));
        assert!(world.agent_at(Position::new(1, 1)).is_none());
    }
}
