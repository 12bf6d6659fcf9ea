//! Systems - per-step logic over the actor world

mod collision;
mod movement;
mod navigation;
mod spawning;

pub use collision::*;
pub use movement::*;
pub use navigation::*;
pub use spawning::*;
