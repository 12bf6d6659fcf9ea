//! Layout configuration and its validation.
//!
//! Sizes in the generator are expressed in abstract units and scaled to
//! world units by `multiplier`. The defaults reproduce the reference
//! environment: 15×15 base area, multiplier 8.5, 2.5 units between rooms and
//! 1.5 units of door clearance.
//!
//! ```
//! use floorplan_logic::config::{validate_config, LayoutConfig};
//!
//! let mut config = LayoutConfig::default();
//! config.kitchens = 2;
//! assert!(validate_config(&config).is_empty());
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bounds on the furniture counts drawn for each room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FurnitureLimits {
    pub toilets: u32,
    pub showers: u32,
    pub sinks: u32,
    pub beds: u32,
    pub wardrobes: u32,
    pub desks: u32,
    pub kitchen_tables: u32,
    pub hall_tables: u32,
    pub sofas: u32,
    pub cupboards: u32,
}

impl Default for FurnitureLimits {
    fn default() -> Self {
        Self {
            toilets: 1,
            showers: 1,
            sinks: 1,
            beds: 2,
            wardrobes: 2,
            desks: 3,
            kitchen_tables: 1,
            hall_tables: 1,
            sofas: 2,
            cupboards: 2,
        }
    }
}

/// Bounds on a single constraint search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Candidate draws per variable before backtracking.
    pub samples_per_variable: u32,
    /// Total candidate draws per search.
    pub max_steps: u32,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            samples_per_variable: 60,
            max_steps: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub kitchens: u32,
    pub halls: u32,
    /// Base environment size in units, before growth per room.
    pub env_width: f32,
    pub env_height: f32,
    /// Units to world units.
    pub multiplier: f32,
    /// Minimum clearance between rooms, in units.
    pub room_gap: f32,
    /// Minimum clearance between furniture and a door, in units.
    pub door_clearance: f32,
    pub door_length: f32,
    pub door_thickness: f32,
    /// Minimum distance between sofas and other hall furniture, in units.
    pub sofa_separation: f32,
    pub furniture: FurnitureLimits,
    /// Redraws allowed per placement sub-problem.
    pub max_attempts: u32,
    pub search: SearchBudget,
    /// Seed for [`crate::layout::generate_seeded`]. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bedrooms: 1,
            bathrooms: 1,
            kitchens: 1,
            halls: 1,
            env_width: 15.0,
            env_height: 15.0,
            multiplier: 8.5,
            room_gap: 2.5,
            door_clearance: 1.5,
            door_length: 2.5,
            door_thickness: 1.0,
            sofa_separation: 1.0,
            furniture: FurnitureLimits::default(),
            max_attempts: 200,
            search: SearchBudget::default(),
            seed: None,
        }
    }
}

impl LayoutConfig {
    /// Generator rng: seeded when `seed` is set, from entropy otherwise.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn room_count(&self) -> u32 {
        self.bedrooms + self.bathrooms + self.kitchens + self.halls
    }

    /// Convert units to world units.
    pub fn world(&self, units: f32) -> f32 {
        units * self.multiplier
    }
}

pub const MAX_BEDROOMS: u32 = 2;
pub const MAX_BATHROOMS: u32 = 2;
pub const MAX_KITCHENS: u32 = 2;
pub const MAX_HALLS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("layout has no rooms")]
    NoRooms,
    #[error("{count} {room}s requested, at most {max} allowed")]
    TooManyRooms {
        room: &'static str,
        count: u32,
        max: u32,
    },
    #[error("multiplier must be positive, got {0}")]
    NonPositiveMultiplier(f32),
    #[error("{0} must not be negative")]
    NegativeMargin(&'static str),
    #[error("base environment size must be positive")]
    EmptyEnvironment,
    #[error("max_attempts must be at least 1")]
    NoAttempts,
    #[error("search budget must allow at least one sample")]
    EmptySearchBudget,
}

/// Validate a layout configuration, returning all errors found.
pub fn validate_config(config: &LayoutConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.room_count() == 0 {
        errors.push(ConfigError::NoRooms);
    }
    for (room, count, max) in [
        ("bedroom", config.bedrooms, MAX_BEDROOMS),
        ("bathroom", config.bathrooms, MAX_BATHROOMS),
        ("kitchen", config.kitchens, MAX_KITCHENS),
        ("hall", config.halls, MAX_HALLS),
    ] {
        if count > max {
            errors.push(ConfigError::TooManyRooms { room, count, max });
        }
    }
    if config.multiplier <= 0.0 {
        errors.push(ConfigError::NonPositiveMultiplier(config.multiplier));
    }
    for (name, value) in [
        ("room_gap", config.room_gap),
        ("door_clearance", config.door_clearance),
        ("sofa_separation", config.sofa_separation),
        ("door_thickness", config.door_thickness),
    ] {
        if value < 0.0 {
            errors.push(ConfigError::NegativeMargin(name));
        }
    }
    if config.env_width <= 0.0 || config.env_height <= 0.0 || config.door_length <= 0.0 {
        errors.push(ConfigError::EmptyEnvironment);
    }
    if config.max_attempts == 0 {
        errors.push(ConfigError::NoAttempts);
    }
    if config.search.samples_per_variable == 0 || config.search.max_steps == 0 {
        errors.push(ConfigError::EmptySearchBudget);
    }

    errors
}
