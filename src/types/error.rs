use thiserror::Error;

use super::report::ValidationReport;

/// Document-level shape errors. Problems inside individual checks never
/// produce one of these; they degrade to permissive defaults instead.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("scenario document must be a JSON object")]
    NotAnObject,

    #[error("scenario is missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("rulesets[{index}] must be an object")]
    RulesetNotAnObject { index: usize },

    #[error("rulesets[{index}].{field} must be {expected}")]
    RulesetField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("audio clip '{field}' must be null or a .mp3 or .wav path")]
    AudioClip { field: &'static str },
}

/// Evaluation was refused because the rules failed structure validation.
#[derive(Debug, Error)]
#[error("{}", report.message)]
pub struct RuleStructureError {
    pub report: ValidationReport,
}
