//! Text syntax for rule expressions.
//!
//! ```text
//! thermostat@hall AND (lamp@desk OR lamp@shelf)
//! ```
//!
//! A clause is `device@anchor`. `AND` binds tighter than `OR` and both are
//! case-insensitive; chains of one operator become a single group.
//! Parentheses open a nested group, `()` is an empty group, names that are
//! not plain identifiers can be double-quoted, and `#` comments run to the
//! end of the line.

mod error;
mod grammar;

pub use error::ParseError;

use crate::ExpressionNode;

/// Parse an expression written in the text syntax.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid expression.
pub fn parse_expression(input: &str) -> Result<ExpressionNode, ParseError> {
    use winnow::Parser;
    grammar::parse_root
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
