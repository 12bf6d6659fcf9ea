//! Floorplan Core - Episode Simulation Engine
//!
//! Drives a learning agent through generated (or loaded) floor plans and
//! feeds its experience to a policy.
//!
//! # Architecture
//!
//! The actors live in an Entity Component System via `hecs`:
//! - **Entities**: the agent and the objective
//! - **Components**: `Body`, `Heading`, `RoomTracker` and the actor markers
//! - **Systems**: movement, room sensing, collision, spawning, door crossing
//!
//! The scene itself and all geometry come from `floorplan-logic`.
//!
//! # Example
//!
//! ```rust,no_run
//! use floorplan_core::prelude::*;
//! use floorplan_logic::config::LayoutConfig;
//! use floorplan_logic::layout::generate_scene;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let scene = generate_scene(&LayoutConfig::default(), &mut rng)?;
//! let driver = EpisodeDriver::new(scene, DriverConfig::default())?;
//! let mut engine = SimulationEngine::new(
//!     driver,
//!     HeuristicPolicy::new(1),
//!     LogMetrics,
//!     EngineConfig::default(),
//! )?;
//! engine.run()?;
//! # Ok::<(), SimError>(())
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod episode;
pub mod error;
pub mod metrics;
pub mod persistence;
pub mod policy;
pub mod systems;

pub use error::SimError;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{DriverConfig, EngineConfig, RewardConfig};
    pub use crate::engine::{RunSummary, SimulationEngine};
    pub use crate::episode::{AbortSignal, EpisodeDriver, EpisodeState, TerminalReason};
    pub use crate::error::SimError;
    pub use crate::metrics::{EpisodeRecord, LogMetrics, MetricsSink, RecordingMetrics};
    pub use crate::policy::{Action, HeuristicPolicy, Policy};
}
