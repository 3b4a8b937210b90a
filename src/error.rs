//! Request-level errors.
//!
//! Only malformed requests fail. Infeasible datasets and non-converging
//! searches produce advisories and fewer valid teams instead.

use thiserror::Error;

use crate::validation::ValidationError;

/// Reasons a formation request is rejected before any work starts.
#[derive(Debug, Error)]
pub enum FormationError {
    #[error("no players to form teams from")]
    EmptyRoster,

    #[error("invalid team size {size}: teams must have at least {min} members")]
    TeamSizeTooSmall { size: usize, min: usize },

    #[error("invalid team size {size}: the dataset supports at most {max} members per team")]
    TeamSizeTooLarge { size: usize, max: usize },

    #[error("invalid rule configuration: {0}")]
    InvalidRules(String),

    #[error("invalid roster: {}", summarize(.0))]
    InvalidRoster(Vec<ValidationError>),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors.first() {
        Some(first) if errors.len() > 1 => {
            format!("{} (and {} more)", first.message, errors.len() - 1)
        }
        Some(first) => first.message.clone(),
        None => "no details".to_string(),
    }
}

impl FormationError {
    /// Whether the caller can retry with a different team size.
    pub fn is_team_size_error(&self) -> bool {
        matches!(
            self,
            FormationError::TeamSizeTooSmall { .. } | FormationError::TeamSizeTooLarge { .. }
        )
    }
}
