use std::fmt;

use super::expr::CompiledExpr;
use super::limits::RuleLimits;
use super::outcome::Outcome;
use super::placement::Placement;
use super::scenario::Rules;

/// A check whose expression has been normalized into a single evaluable form.
#[derive(Debug, Clone)]
pub(crate) struct CompiledCheck {
    pub(crate) aim_id: String,
    pub(crate) connected_required: bool,
    pub(crate) condition: CompiledExpr,
}

/// Rules normalized once and ready to be evaluated any number of times.
///
/// Immutable and `Send + Sync`, so one instance can serve every submit of a
/// scenario, from any thread.
///
/// # Example
///
/// ```
/// use aimcheck::{all_of, clause, AimCheck, CompiledRules, Placement, RuleLimits, Rules};
///
/// let rules = Rules::new(vec![
///     AimCheck::new("light").tree(all_of(vec![clause("lamp", "desk")])),
/// ]);
/// let compiled = CompiledRules::compile(&rules, RuleLimits::default());
/// let outcome = compiled.evaluate(&[Placement::new("lamp", "desk")], false);
/// assert_eq!(outcome.get("light"), Some(true));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub(crate) checks: Vec<CompiledCheck>,
    pub(crate) limits: RuleLimits,
}

impl CompiledRules {
    /// Normalize every check. Never fails: malformed parts compile to
    /// constants according to the permissive evaluation policy.
    pub fn compile(rules: &Rules, limits: RuleLimits) -> Self {
        crate::compile::compile(rules, limits)
    }

    /// Evaluate every check against the placements.
    pub fn evaluate(&self, placements: &[Placement], connected: bool) -> Outcome {
        crate::evaluate::evaluate_compiled(&self.checks, placements, connected)
    }

    /// Aim ids in check order.
    #[must_use]
    pub fn aim_ids(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.aim_id.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    #[must_use]
    pub fn limits(&self) -> RuleLimits {
        self.limits
    }
}

impl fmt::Display for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompiledRules({} checks, max group depth {})",
            self.checks.len(),
            self.limits.group_depth(),
        )
    }
}
