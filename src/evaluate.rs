use tracing::{debug, instrument};

use crate::types::{CompiledCheck, CompiledExpr};
use crate::{
    AimCheck, CompiledRules, Operator, Outcome, Placement, RuleLimits, RuleStructureError, Rules,
    Scenario,
};

/// Evaluate every check of a scenario against the learner's placements.
///
/// Each aim passes when its device expression is satisfied and, if the check
/// requires it, `connected` is true. Groups nested beyond
/// [`MAX_RULE_GROUP_DEPTH`](crate::MAX_RULE_GROUP_DEPTH) evaluate to `false`.
pub fn evaluate(scenario: &Scenario, placements: &[Placement], connected: bool) -> Outcome {
    evaluate_rules(&scenario.rules, placements, connected)
}

/// [`evaluate`] for a bare rules section.
pub fn evaluate_rules(rules: &Rules, placements: &[Placement], connected: bool) -> Outcome {
    CompiledRules::compile(rules, RuleLimits::default()).evaluate(placements, connected)
}

/// Validate the rule structure first and refuse to evaluate if it is
/// unsupported, returning the validation report instead.
///
/// # Errors
///
/// Returns [`RuleStructureError`] when any check nests groups deeper than
/// `limits` allows.
pub fn evaluate_validated(
    scenario: &Scenario,
    placements: &[Placement],
    connected: bool,
    limits: RuleLimits,
) -> Result<Outcome, RuleStructureError> {
    let report = crate::validate::validate_all_checks(&scenario.rules.checks, limits.group_depth());
    if !report.ok {
        debug!(issues = report.issues.len(), "refusing to evaluate unsupported rules");
        return Err(RuleStructureError { report });
    }
    Ok(CompiledRules::compile(&scenario.rules, limits).evaluate(placements, connected))
}

/// Whether the placements satisfy a check's device expression, ignoring
/// its connection requirement.
#[must_use]
pub fn resolve_check(check: &AimCheck, placements: &[Placement]) -> bool {
    let compiled = crate::compile::compile_check(check, RuleLimits::default());
    eval_expr(&compiled.condition, placements)
}

#[instrument(level = "debug", skip_all, fields(checks = checks.len(), placements = placements.len()))]
pub(crate) fn evaluate_compiled(
    checks: &[CompiledCheck],
    placements: &[Placement],
    connected: bool,
) -> Outcome {
    let mut outcome = Outcome::new();
    for check in checks {
        let devices = eval_expr(&check.condition, placements);
        let connection = !check.connected_required || connected;
        debug!(aim = %check.aim_id, devices, connection, "check evaluated");
        outcome.insert(&check.aim_id, devices && connection);
    }
    outcome
}

fn eval_expr(expr: &CompiledExpr, placements: &[Placement]) -> bool {
    match expr {
        CompiledExpr::Const(value) => *value,
        CompiledExpr::Placed(clause) => placements.iter().any(|p| p.satisfies(clause)),
        CompiledExpr::All(children) => children.iter().all(|c| eval_expr(c, placements)),
        CompiledExpr::Any(children) => children.iter().any(|c| eval_expr(c, placements)),
        CompiledExpr::Fold(steps) => {
            let mut steps = steps.iter();
            let Some((_, seed)) = steps.next() else {
                return true;
            };
            steps.fold(eval_expr(seed, placements), |acc, (operator, step)| match operator {
                Operator::Or => acc || eval_expr(step, placements),
                Operator::And => acc && eval_expr(step, placements),
            })
        }
    }
}
