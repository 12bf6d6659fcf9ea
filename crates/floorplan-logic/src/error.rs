//! Errors raised while generating a floor plan.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// A placement sub-problem found no solution within its retry cap.
    #[error("{stage} placement unsatisfiable after {attempts} attempts")]
    Unsatisfiable { stage: &'static str, attempts: u32 },

    #[error("invalid layout configuration: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),

    /// A room plan asks for more than its room can ever hold.
    #[error("{room} plan cannot hold {requested} {item}")]
    InvalidPlan {
        room: &'static str,
        item: &'static str,
        requested: u32,
    },
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
