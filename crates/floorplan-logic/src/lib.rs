//! Pure floor-plan logic.
//!
//! Everything here is independent of the simulation engine: functions take
//! plain data (and an explicit RNG where randomness is involved) and return
//! results, so they are unit-testable in isolation and shared by the engine
//! and the headless harness.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Layout configuration, defaults and validation |
//! | [`error`] | Generation errors |
//! | [`geometry`] | Points, boxes, segment intersection, containment |
//! | [`layout`] | Room shell, doors, floor and per-room furniture programs |
//! | [`perception`] | Ray-fan observation of a scene from the agent's pose |
//! | [`scene`] | Scene arena: rooms, doors, furniture hierarchy |
//! | [`solver`] | Randomized backtracking solver for box placement |
//! | [`validation`] | Layout invariant checks for generated and loaded scenes |

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod perception;
pub mod scene;
pub mod solver;
pub mod validation;

pub use error::GenerationError;
