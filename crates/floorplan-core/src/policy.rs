//! Policy seam and the reference heuristic policy.
//!
//! A [`Policy`] chooses actions from ray observations, stores transitions
//! and learns from them between episodes. The engine only relies on the
//! trait; [`HeuristicPolicy`] is a seeded rule-based stand-in for a learned
//! model that exercises the full loop.

use std::collections::{HashMap, VecDeque};

use floorplan_logic::perception::Observation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discrete agent action, encoded `0..=2` at the policy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Rotate heading by +45°.
    TurnLeft,
    /// Rotate heading by −45°.
    TurnRight,
    /// Step `speed` units along the heading.
    Forward,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::TurnLeft, Action::TurnRight, Action::Forward];

    pub fn index(self) -> u8 {
        match self {
            Action::TurnLeft => 0,
            Action::TurnRight => 1,
            Action::Forward => 2,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::TurnLeft),
            1 => Ok(Action::TurnRight),
            2 => Ok(Action::Forward),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    /// The action was an exploration draw.
    pub random: bool,
}

/// `(angle, distance, objective)` per ray.
pub type State = Vec<[f32; 3]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub next_state: State,
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayStats {
    /// Mean policy entropy over the replayed batch, in bits.
    pub entropy: f32,
    /// Exploration rate after this replay.
    pub exploration: f32,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    /// Raised from inside a long-running call when the user stops the run.
    #[error("user abort")]
    UserAbort,
    #[error("{0}")]
    Failed(String),
}

pub trait Policy {
    fn act(&mut self, observation: &Observation) -> Decision;
    fn remember(&mut self, transition: Transition);
    fn replay(&mut self, batch: usize) -> Result<ReplayStats, PolicyError>;
    fn save(&mut self, name: &str) -> Result<(), PolicyError>;
    fn load(&mut self, name: &str, exploration: f32) -> Result<(), PolicyError>;
}

/// Rays closer than this (normalized) trigger an evasive turn.
pub const AVOID_DISTANCE: f32 = 0.049;
/// Rays whose objective flag means "straight ahead".
const CENTER_RAYS: [usize; 3] = [18, 19, 20];
const MEMORY_CAPACITY: usize = 100_000;
const PENDING_CAPACITY: usize = 200;

/// Rule-based policy with ε-greedy exploration.
///
/// Exploration draws are biased toward moving forward: 1 in 25 turns left,
/// 1 in 25 turns right. Rewarded transitions are held back and always make
/// it into the next replay batch.
pub struct HeuristicPolicy {
    rng: StdRng,
    epsilon: f32,
    epsilon_min: f32,
    epsilon_decay: f32,
    memory: VecDeque<Transition>,
    pending: VecDeque<Transition>,
    saved: HashMap<String, f32>,
}

impl HeuristicPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            epsilon: 1.0,
            epsilon_min: 0.025,
            epsilon_decay: 0.996,
            memory: VecDeque::new(),
            pending: VecDeque::new(),
            saved: HashMap::new(),
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Stored transitions, replayed or not.
    pub fn memory_len(&self) -> usize {
        self.memory.len() + self.pending.len()
    }

    /// Exploration rate stored under `name` by [`Policy::save`].
    pub fn saved_exploration(&self, name: &str) -> Option<f32> {
        self.saved.get(name).copied()
    }

    fn explore(&mut self) -> Action {
        match self.rng.gen_range(0..25) {
            0 => Action::TurnLeft,
            1 => Action::TurnRight,
            _ => Action::Forward,
        }
    }
}

/// Shannon entropy in bits of the action distribution of `batch`.
pub fn action_entropy<'a>(batch: impl Iterator<Item = &'a Transition>) -> f32 {
    let mut counts = [0usize; 3];
    let mut total = 0usize;
    for t in batch {
        counts[t.action.index() as usize] += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f32 / total as f32;
            -p * p.log2()
        })
        .sum()
}

impl Policy for HeuristicPolicy {
    fn act(&mut self, observation: &Observation) -> Decision {
        let closest = observation
            .rays
            .iter()
            .filter(|r| !r.objective)
            .map(|r| r.distance)
            .fold(1.0f32, f32::min);
        if closest < AVOID_DISTANCE {
            let action = if self.rng.gen_bool(0.5) {
                Action::TurnLeft
            } else {
                Action::TurnRight
            };
            return Decision {
                action,
                random: false,
            };
        }

        if self.rng.gen::<f32>() <= self.epsilon {
            let ahead = CENTER_RAYS
                .iter()
                .any(|&i| observation.rays.get(i).map_or(false, |r| r.objective));
            if ahead {
                return Decision {
                    action: Action::Forward,
                    random: false,
                };
            }
            return Decision {
                action: self.explore(),
                random: true,
            };
        }

        // Rays run from facing + 60° (left) to facing − 57° (right).
        let action = match observation.rays.iter().position(|r| r.objective) {
            Some(i) if i < CENTER_RAYS[0] => Action::TurnLeft,
            Some(i) if i > CENTER_RAYS[2] => Action::TurnRight,
            _ => Action::Forward,
        };
        Decision {
            action,
            random: false,
        }
    }

    fn remember(&mut self, transition: Transition) {
        if transition.reward == 0.0 {
            if self.memory.len() == MEMORY_CAPACITY {
                self.memory.pop_front();
            }
            self.memory.push_back(transition);
        } else {
            if self.pending.len() == PENDING_CAPACITY {
                self.pending.pop_front();
            }
            self.pending.push_back(transition);
        }
    }

    fn replay(&mut self, batch: usize) -> Result<ReplayStats, PolicyError> {
        // Rewarded transitions always join the batch; plain ones are sampled.
        let fresh = self.pending.len();
        for t in self.pending.drain(..) {
            if self.memory.len() == MEMORY_CAPACITY {
                self.memory.pop_front();
            }
            self.memory.push_back(t);
        }
        let start = self.memory.len() - fresh.min(self.memory.len());
        let mut minibatch: Vec<usize> = (start..self.memory.len()).collect();

        let wanted = batch.saturating_sub(minibatch.len()).min(start);
        if wanted > 0 {
            let sampled = rand::seq::index::sample(&mut self.rng, start, wanted);
            minibatch.extend(sampled.iter());
        }

        let entropy = action_entropy(minibatch.iter().map(|&i| &self.memory[i]));
        if self.epsilon > self.epsilon_min {
            self.epsilon *= self.epsilon_decay;
        }
        log::debug!(
            "replayed {} transitions, epsilon {:.4}",
            minibatch.len(),
            self.epsilon
        );
        Ok(ReplayStats {
            entropy,
            exploration: self.epsilon,
        })
    }

    fn save(&mut self, name: &str) -> Result<(), PolicyError> {
        log::info!("saving policy {} with epsilon {}", name, self.epsilon);
        self.saved.insert(name.to_string(), self.epsilon);
        Ok(())
    }

    fn load(&mut self, name: &str, exploration: f32) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&exploration) {
            return Err(PolicyError::Failed(format!(
                "exploration rate {} for {} outside [0, 1]",
                exploration, name
            )));
        }
        log::info!("loading policy {} with epsilon {}", name, exploration);
        self.epsilon = exploration;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use floorplan_logic::perception::{RayReading, RAY_COUNT};

    fn observation(distance: f32, objective_ray: Option<usize>) -> Observation {
        let rays: Vec<RayReading> = (0..RAY_COUNT)
            .map(|i| RayReading {
                degrees: 0.0,
                angle: 0.0,
                distance,
                objective: Some(i) == objective_ray,
            })
            .collect();
        let sees_objective = objective_ray.is_some();
        Observation {
            rays,
            sees_objective,
        }
    }

    fn transition(action: Action, reward: f32) -> Transition {
        Transition {
            state: vec![[0.0, 1.0, 0.0]],
            action,
            reward,
            next_state: vec![[0.0, 1.0, 0.0]],
            terminal: false,
        }
    }

    #[test]
    fn action_codes_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::try_from(action.index()), Ok(action));
        }
        assert_eq!(Action::try_from(3), Err(3));
    }

    #[test]
    fn close_walls_force_a_turn() {
        let mut policy = HeuristicPolicy::new(1);
        for _ in 0..20 {
            let d = policy.act(&observation(0.01, None));
            assert_ne!(d.action, Action::Forward);
            assert!(!d.random);
        }
    }

    #[test]
    fn exploration_moves_toward_objective_ahead() {
        let mut policy = HeuristicPolicy::new(2);
        let d = policy.act(&observation(0.5, Some(19)));
        assert_eq!(d.action, Action::Forward);
        assert!(!d.random);
    }

    #[test]
    fn greedy_policy_steers_to_objective() {
        let mut policy = HeuristicPolicy::new(3);
        policy.load("greedy", 0.0).unwrap();
        assert_eq!(policy.act(&observation(0.5, Some(3))).action, Action::TurnLeft);
        assert_eq!(policy.act(&observation(0.5, Some(35))).action, Action::TurnRight);
        assert_eq!(policy.act(&observation(0.5, None)).action, Action::Forward);
    }

    #[test]
    fn exploration_is_mostly_forward() {
        let mut policy = HeuristicPolicy::new(4);
        let draws: Vec<Decision> = (0..500).map(|_| policy.act(&observation(0.5, None))).collect();
        assert!(draws.iter().all(|d| d.random));
        let forward = draws.iter().filter(|d| d.action == Action::Forward).count();
        assert!(forward > 400, "forward {}", forward);
    }

    #[test]
    fn replay_decays_epsilon_and_reports_entropy() {
        let mut policy = HeuristicPolicy::new(5);
        policy.remember(transition(Action::TurnLeft, 0.0));
        policy.remember(transition(Action::Forward, 4.0));
        assert_eq!(policy.memory_len(), 2);
        let stats = policy.replay(100).unwrap();
        assert_relative_eq!(stats.entropy, 1.0);
        assert_relative_eq!(stats.exploration, 0.996);
        assert_eq!(policy.memory_len(), 2);
    }

    #[test]
    fn entropy_of_single_action_is_zero() {
        let batch = [transition(Action::Forward, 1.0), transition(Action::Forward, 0.0)];
        assert_eq!(action_entropy(batch.iter()), 0.0);
        assert_eq!(action_entropy(std::iter::empty()), 0.0);
    }

    #[test]
    fn save_and_load_keep_exploration() {
        let mut policy = HeuristicPolicy::new(6);
        policy.load("run", 0.3).unwrap();
        policy.save("run").unwrap();
        assert_eq!(policy.saved_exploration("run"), Some(0.3));
        assert!(policy.load("run", 1.5).is_err());
    }
}
