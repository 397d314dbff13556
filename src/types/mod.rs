mod compiled_rules;
mod error;
mod expr;
mod limits;
mod outcome;
mod placement;
mod report;
mod scenario;

pub use compiled_rules::CompiledRules;
pub(crate) use compiled_rules::CompiledCheck;
pub use error::{LoadError, RuleStructureError};
pub(crate) use expr::CompiledExpr;
pub use expr::{all_of, any_of, clause, Clause, Expression, ExpressionNode, LegacyClause, Operator};
pub use limits::{RuleLimits, MAX_RULE_GROUP_DEPTH};
pub use outcome::Outcome;
pub use placement::Placement;
pub use report::{CheckIssue, DepthReport, DepthViolation, ValidationReport};
pub use scenario::{Aim, AimCheck, Anchor, Rules, Ruleset, RulesetAnswer, Scenario};
