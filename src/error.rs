use thiserror::Error;

use crate::parse::ParseError;
use crate::{LoadError, RuleStructureError};

/// Unified error type covering loading, parsing, validation and I/O.
///
/// Returned by convenience methods like
/// [`Scenario::from_file()`](crate::Scenario::from_file). Evaluation itself
/// never fails.
#[derive(Debug, Error)]
pub enum AimcheckError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Structure(#[from] RuleStructureError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
