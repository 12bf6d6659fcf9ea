//! Driver and engine configuration.
//!
//! Sizes and speeds are in world units. The defaults reproduce the
//! reference training setup: an 8×8 agent moving 2 units per step, a 15×15
//! objective, 5000 episodes with replay batches of 100.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reward terms of a non-terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub survival: f32,
    /// Subtracted every `decay_interval` frames while the reward is positive.
    pub decay: f32,
    pub decay_interval: u32,
    pub objective_seen: f32,
    /// Granted when the distance to the objective beats the episode best.
    pub closer: f32,
    pub capture: f32,
    pub room_change: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            survival: 1.0,
            decay: 1.0,
            decay_interval: 10,
            objective_seen: 3.0,
            closer: 5.0,
            capture: 10.0,
            room_change: 1.0,
        }
    }
}

/// Center-to-center window in which a door counts as near: within `depth`
/// along one axis and `lateral` along the other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoorWindow {
    pub lateral: f32,
    pub depth: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Distance covered by one forward step.
    pub speed: f32,
    pub agent_size: f32,
    pub objective_size: f32,
    /// Heading after every agent respawn, in degrees.
    pub initial_heading: u16,
    /// Transitions are handed to the policy only after this many frames.
    pub remember_after: u32,
    /// Enable the rule-based door-crossing override.
    pub logic_driver: bool,
    /// Window that triggers the override.
    pub door_front: DoorWindow,
    /// Window used to pick the door to cross once triggered.
    pub door_closest: DoorWindow,
    /// Frames since the last room change before the override may trigger.
    pub door_activation_frames: u32,
    /// Fraction of the room size kept clear on each side when spawning.
    pub spawn_inset: f32,
    pub max_spawn_attempts: u32,
    pub rewards: RewardConfig,
    pub seed: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            agent_size: 8.0,
            objective_size: 15.0,
            initial_heading: 90,
            remember_after: 5,
            logic_driver: false,
            door_front: DoorWindow {
                lateral: 4.0,
                depth: 12.0,
            },
            door_closest: DoorWindow {
                lateral: 10.0,
                depth: 40.0,
            },
            door_activation_frames: 20,
            spawn_inset: 0.15,
            max_spawn_attempts: 1000,
            rewards: RewardConfig::default(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub episodes: u32,
    pub replay_batch: usize,
    /// Name the policy is saved and loaded under.
    pub policy_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            episodes: 5000,
            replay_batch: 100,
            policy_name: "test".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be positive")]
    NonPositive(&'static str),
    #[error("heading {0} is not a multiple of 45 below 360")]
    BadHeading(u16),
    #[error("spawn inset {0} must lie in [0, 0.5)")]
    BadInset(f32),
    #[error("max_spawn_attempts must be at least 1")]
    NoSpawnAttempts,
    #[error("decay interval must be at least 1")]
    NoDecayInterval,
    #[error("policy name must not be empty")]
    EmptyPolicyName,
}

/// Validate a driver configuration, returning all errors found.
pub fn validate_config(config: &DriverConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    for (name, value) in [
        ("speed", config.speed),
        ("agent_size", config.agent_size),
        ("objective_size", config.objective_size),
        ("door_front", config.door_front.lateral.min(config.door_front.depth)),
        (
            "door_closest",
            config.door_closest.lateral.min(config.door_closest.depth),
        ),
    ] {
        if value <= 0.0 {
            errors.push(ConfigError::NonPositive(name));
        }
    }
    if config.initial_heading >= 360 || config.initial_heading % 45 != 0 {
        errors.push(ConfigError::BadHeading(config.initial_heading));
    }
    if !(0.0..0.5).contains(&config.spawn_inset) {
        errors.push(ConfigError::BadInset(config.spawn_inset));
    }
    if config.max_spawn_attempts == 0 {
        errors.push(ConfigError::NoSpawnAttempts);
    }
    if config.rewards.decay_interval == 0 {
        errors.push(ConfigError::NoDecayInterval);
    }

    errors
}

pub fn validate_engine_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();
    if config.episodes == 0 {
        errors.push(ConfigError::NonPositive("episodes"));
    }
    if config.replay_batch == 0 {
        errors.push(ConfigError::NonPositive("replay_batch"));
    }
    if config.policy_name.is_empty() {
        errors.push(ConfigError::EmptyPolicyName);
    }
    errors
}
