use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::environment::{Action, Episode};

/// Trait defining how a player picks its action.
///
/// `&mut self` lets a policy keep internal state (an RNG, a plan) between
/// turns.
pub trait Policy {
    fn choose_action(&mut self, episode: &Episode, player: usize) -> Action;
}

/// Picks uniformly among the legal actions.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn choose_action(&mut self, episode: &Episode, player: usize) -> Action {
        let legal = episode.legal_actions(player).unwrap_or_default();
        if legal.is_empty() {
            return Action::Stay;
        }
        legal[self.rng.random_range(0..legal.len())]
    }
}

/// Never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct StayPolicy;

impl Policy for StayPolicy {
    fn choose_action(&mut self, _episode: &Episode, _player: usize) -> Action {
        Action::Stay
    }
}

impl Episode {
    /// Asks policy `i` for player `i`'s action and applies the turn. Players
    /// without a policy stay.
    pub fn step_with_policies(&mut self, policies: &mut [Box<dyn Policy>]) {
        let actions: Vec<Action> = (0..self.num_players())
            .map(|player| {
                policies
                    .get_mut(player)
                    .map_or(Action::Stay, |policy| policy.choose_action(self, player))
            })
            .collect();
        self.apply_typed_actions(&actions);
    }
}
