//! Engine error taxonomy.

use floorplan_logic::GenerationError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::policy::PolicyError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A persisted scene is missing fields or is inconsistent.
    #[error("malformed scene: {0}")]
    MalformedScene(String),

    /// The run was stopped from outside, either through the abort signal
    /// or by the policy during replay.
    #[error("aborted by user")]
    UserAbort,

    #[error("scene has no rooms")]
    EmptyScene,

    #[error("could not place {what} after {attempts} attempts")]
    SpawnFailed { what: &'static str, attempts: u32 },

    #[error("episode is not running")]
    NotRunning,

    /// An actor entity lost a component it is spawned with.
    #[error("actor state missing: {0}")]
    Actor(String),

    #[error("policy failed: {0}")]
    Policy(String),

    #[error("invalid engine configuration: {}", join(.0))]
    InvalidConfig(Vec<ConfigError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checkpoint serialization error: {0}")]
    Checkpoint(#[from] Box<bincode::ErrorKind>),

    #[error("checkpoint version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl From<PolicyError> for SimError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::UserAbort => SimError::UserAbort,
            PolicyError::Failed(message) => SimError::Policy(message),
        }
    }
}

impl From<hecs::ComponentError> for SimError {
    fn from(e: hecs::ComponentError) -> Self {
        SimError::Actor(e.to_string())
    }
}

fn join(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_abort_maps_to_user_abort() {
        assert!(matches!(
            SimError::from(PolicyError::UserAbort),
            SimError::UserAbort
        ));
        match SimError::from(PolicyError::Failed("nan loss".into())) {
            SimError::Policy(message) => assert_eq!(message, "nan loss"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn version_mismatch_names_both_versions() {
        let e = SimError::VersionMismatch {
            expected: 1,
            found: 7,
        };
        assert_eq!(
            e.to_string(),
            "checkpoint version mismatch: expected 1, found 7"
        );
    }
}
