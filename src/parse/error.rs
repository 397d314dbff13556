use std::fmt;

/// Error produced when expression text cannot be parsed.
///
/// The message is winnow's rendering of the failure, which points at the
/// offending column of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rule expression: {}", self.message)
    }
}

impl std::error::Error for ParseError {}
