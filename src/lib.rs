//! Pass/fail rule evaluation for device-placement learning scenarios.
//!
//! A scenario's `rules.checks` pair each aim with an expression over
//! `(device, anchor)` placement facts. [`evaluate`] resolves every check
//! against the learner's placements and the scenario-wide `connected` flag.
//!
//! ```
//! use aimcheck::{evaluate, AimCheck, ExpressionNode, Placement, Rules, Scenario};
//!
//! let expr = ExpressionNode::from_text("thermostat@hall AND (lamp@desk OR lamp@shelf)").unwrap();
//! let scenario = Scenario::from_rules(Rules::new(vec![
//!     AimCheck::new("comfort").connected_required(true).tree(expr),
//! ]));
//!
//! let placements = [Placement::new("thermostat", "hall"), Placement::new("lamp", "shelf")];
//! assert_eq!(evaluate(&scenario, &placements, true).get("comfort"), Some(true));
//! assert_eq!(evaluate(&scenario, &placements, false).get("comfort"), Some(false));
//! ```

mod compile;
mod error;
mod evaluate;
mod load;
pub mod parse;
mod types;
pub mod validate;

pub use compile::legacy_to_tree;
pub use error::AimcheckError;
pub use evaluate::{evaluate, evaluate_rules, evaluate_validated, resolve_check};
pub use types::{
    all_of, any_of, clause, Aim, AimCheck, Anchor, CheckIssue, Clause, CompiledRules,
    DepthReport, DepthViolation, Expression, ExpressionNode, LegacyClause, LoadError, Operator,
    Outcome, Placement, RuleLimits, RuleStructureError, Rules, Ruleset, RulesetAnswer, Scenario,
    ValidationReport, MAX_RULE_GROUP_DEPTH,
};
pub use validate::{validate_all_checks, validate_all_checks_with, validate_group_depth};
