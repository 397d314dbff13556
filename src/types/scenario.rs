use serde::Serialize;

use super::expr::{Clause, Expression, ExpressionNode, LegacyClause};

/// Pass/fail rule for one aim.
///
/// `expression` takes precedence over `required_placements`, which is the
/// oldest storage format (an implicit AND over its pairs).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AimCheck {
    pub aim_id: String,
    pub connected_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_placements: Vec<Clause>,
}

impl AimCheck {
    pub fn new(aim_id: impl Into<String>) -> Self {
        Self {
            aim_id: aim_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn connected_required(mut self, required: bool) -> Self {
        self.connected_required = required;
        self
    }

    #[must_use]
    pub fn tree(mut self, node: ExpressionNode) -> Self {
        self.expression = Some(Expression::Tree(node));
        self
    }

    #[must_use]
    pub fn legacy(mut self, clauses: Vec<LegacyClause>) -> Self {
        self.expression = Some(Expression::Legacy(clauses));
        self
    }

    #[must_use]
    pub fn required_placements(mut self, pairs: Vec<Clause>) -> Self {
        self.required_placements = pairs;
        self
    }

    /// The tree root, if the expression is tree-shaped.
    #[must_use]
    pub fn tree_root(&self) -> Option<&ExpressionNode> {
        match &self.expression {
            Some(Expression::Tree(node)) => Some(node),
            _ => None,
        }
    }
}

/// The `rules` section of a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rules {
    pub require_connect_button: bool,
    pub checks: Vec<AimCheck>,
}

impl Rules {
    #[must_use]
    pub fn new(checks: Vec<AimCheck>) -> Self {
        Self {
            require_connect_button: false,
            checks,
        }
    }
}

/// A named learning objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aim {
    pub id: String,
    pub text: String,
}

/// A point on the stage where a device may be placed. Coordinates are
/// normalized to the background image (0.0..=1.0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anchor {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A statement offered to the learner for judging after placement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Ruleset {
    pub id: Option<String>,
    pub text: Option<String>,
    pub correct: Option<RulesetAnswer>,
}

/// The `correct` marker of a ruleset, kept in the JSON type it was written in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RulesetAnswer {
    Flag(bool),
    Text(String),
    Number(f64),
}

/// The parts of an authored scenario document the evaluator cares about.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub title: Option<String>,
    pub aims: Vec<Aim>,
    pub anchors: Vec<Anchor>,
    pub allowed_device_ids: Vec<String>,
    pub rulesets: Vec<Ruleset>,
    pub rules: Rules,
}

impl Scenario {
    /// A scenario carrying only rules, for callers that build checks in code.
    #[must_use]
    pub fn from_rules(rules: Rules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn aim(&self, id: &str) -> Option<&Aim> {
        self.aims.iter().find(|a| a.id == id)
    }
}
