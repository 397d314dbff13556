use std::fmt;

use serde::Serialize;

/// Boolean combinator of a group or a legacy clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    /// `"or"` selects [`Operator::Or`]; every other spelling falls back to
    /// [`Operator::And`].
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        if s == "or" {
            Operator::Or
        } else {
            Operator::And
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "AND"),
            Operator::Or => write!(f, "OR"),
        }
    }
}

/// A required (device, anchor) pair.
///
/// Empty ids are how missing fields are represented after loading; a clause
/// with either id empty never matches a placement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    pub device_id: String,
    pub anchor_id: String,
}

impl Clause {
    pub fn new(device_id: impl Into<String>, anchor_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            anchor_id: anchor_id.into(),
        }
    }

    /// Both ids are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.device_id.is_empty() && !self.anchor_id.is_empty()
    }
}

/// Tree-shaped rule expression as authored in the scenario document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExpressionNode {
    Clause(Clause),
    Group {
        operator: Operator,
        children: Vec<ExpressionNode>,
    },
    /// An object that is neither a clause nor a group. Evaluates to `false`.
    Unknown,
}

impl ExpressionNode {
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, ExpressionNode::Group { .. })
    }

    /// Parse the text syntax described in [`crate::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`](crate::parse::ParseError) on invalid input.
    pub fn from_text(input: &str) -> Result<Self, crate::parse::ParseError> {
        crate::parse::parse_expression(input)
    }
}

/// One entry of the flat, pre-tree expression format.
///
/// The operator of the first entry is ignored during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyClause {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    pub device_id: String,
    pub anchor_id: String,
}

impl LegacyClause {
    pub fn new(
        operator: Option<Operator>,
        device_id: impl Into<String>,
        anchor_id: impl Into<String>,
    ) -> Self {
        Self {
            operator,
            device_id: device_id.into(),
            anchor_id: anchor_id.into(),
        }
    }

    #[must_use]
    pub fn clause(&self) -> Clause {
        Clause::new(self.device_id.clone(), self.anchor_id.clone())
    }
}

/// The `expression` of a check, in whichever shape it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Expression {
    Legacy(Vec<LegacyClause>),
    Tree(ExpressionNode),
}

/// Normalized expression: every shape compiles into this before evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CompiledExpr {
    Const(bool),
    /// A complete clause, matched with [`Placement::satisfies`](crate::Placement::satisfies).
    Placed(Clause),
    All(Vec<CompiledExpr>),
    Any(Vec<CompiledExpr>),
    /// Legacy accumulator: the first step seeds, each later step combines
    /// with its own operator. Kept flat so array length never adds nesting.
    Fold(Vec<(Operator, CompiledExpr)>),
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let bare = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
        && !is_keyword(name);
    if bare {
        write!(f, "{name}")
    } else {
        write!(f, "\"")?;
        for c in name.chars() {
            match c {
                '"' => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                c => write!(f, "{c}")?,
            }
        }
        write!(f, "\"")
    }
}

fn is_keyword(name: &str) -> bool {
    name.eq_ignore_ascii_case("and") || name.eq_ignore_ascii_case("or")
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_name(f, &self.device_id)?;
        write!(f, "@")?;
        write_name(f, &self.anchor_id)
    }
}

impl fmt::Display for ExpressionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionNode::Clause(c) => write!(f, "{c}"),
            ExpressionNode::Group { operator, children } => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {operator} ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, ")")
            }
            ExpressionNode::Unknown => write!(f, "<unknown>"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Tree(node) => write!(f, "{node}"),
            Expression::Legacy(clauses) => {
                write!(f, "[")?;
                for (i, lc) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", lc.operator.unwrap_or_default())?;
                    }
                    write!(f, "{}", lc.clause())?;
                }
                write!(f, "]")
            }
        }
    }
}

#[must_use]
pub fn clause(device_id: &str, anchor_id: &str) -> ExpressionNode {
    ExpressionNode::Clause(Clause::new(device_id, anchor_id))
}

#[must_use]
pub fn all_of(children: Vec<ExpressionNode>) -> ExpressionNode {
    ExpressionNode::Group {
        operator: Operator::And,
        children,
    }
}

#[must_use]
pub fn any_of(children: Vec<ExpressionNode>) -> ExpressionNode {
    ExpressionNode::Group {
        operator: Operator::Or,
        children,
    }
}
