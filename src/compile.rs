use tracing::{debug, instrument, warn};

use crate::types::{CompiledCheck, CompiledExpr};
use crate::{
    AimCheck, Clause, CompiledRules, Expression, ExpressionNode, LegacyClause, Operator,
    RuleLimits, Rules,
};

#[instrument(level = "debug", skip_all, fields(checks = rules.checks.len()))]
pub(crate) fn compile(rules: &Rules, limits: RuleLimits) -> CompiledRules {
    let checks = rules
        .checks
        .iter()
        .map(|check| compile_check(check, limits))
        .collect();
    CompiledRules { checks, limits }
}

pub(crate) fn compile_check(check: &AimCheck, limits: RuleLimits) -> CompiledCheck {
    CompiledCheck {
        aim_id: check.aim_id.clone(),
        connected_required: check.connected_required,
        condition: compile_condition(check, limits),
    }
}

/// Picks the expression shape in precedence order: non-empty legacy array,
/// tree, `required_placements`, then nothing (vacuously true).
fn compile_condition(check: &AimCheck, limits: RuleLimits) -> CompiledExpr {
    match &check.expression {
        Some(Expression::Legacy(clauses)) if !clauses.is_empty() => {
            debug!(
                aim = %check.aim_id,
                clauses = clauses.len(),
                "folding legacy clause array"
            );
            return compile_legacy(clauses);
        }
        Some(Expression::Tree(node)) => {
            return compile_node(node, 0, limits.group_depth(), &check.aim_id);
        }
        _ => {}
    }

    if check.required_placements.is_empty() {
        CompiledExpr::Const(true)
    } else {
        CompiledExpr::All(
            check
                .required_placements
                .iter()
                .map(compile_clause)
                .collect(),
        )
    }
}

fn compile_node(
    node: &ExpressionNode,
    depth: usize,
    max_depth: usize,
    aim_id: &str,
) -> CompiledExpr {
    match node {
        ExpressionNode::Clause(c) => compile_clause(c),
        ExpressionNode::Group { operator, children } => {
            if depth > max_depth {
                warn!(
                    aim = %aim_id,
                    depth,
                    max_depth,
                    "group nested too deeply; treating as unsatisfiable"
                );
                return CompiledExpr::Const(false);
            }
            if children.is_empty() {
                return CompiledExpr::Const(true);
            }
            let compiled = children
                .iter()
                .map(|child| {
                    let child_depth = if child.is_group() { depth + 1 } else { depth };
                    compile_node(child, child_depth, max_depth, aim_id)
                })
                .collect();
            match operator {
                Operator::And => CompiledExpr::All(compiled),
                Operator::Or => CompiledExpr::Any(compiled),
            }
        }
        ExpressionNode::Unknown => CompiledExpr::Const(false),
    }
}

/// One flat step per clause. The group depth limit does not apply.
fn compile_legacy(clauses: &[LegacyClause]) -> CompiledExpr {
    CompiledExpr::Fold(
        clauses
            .iter()
            .map(|lc| (lc.operator.unwrap_or_default(), compile_clause(&lc.clause())))
            .collect(),
    )
}

fn compile_clause(clause: &Clause) -> CompiledExpr {
    if clause.is_complete() {
        CompiledExpr::Placed(clause.clone())
    } else {
        CompiledExpr::Const(false)
    }
}

/// Rewrite a legacy clause array as an equivalent tree.
///
/// The array is a left fold: the first clause seeds the result and each later
/// clause combines with everything before it using its own operator, so
/// `[a, or b, and c]` becomes `((a OR b) AND c)`. Consecutive clauses with the
/// same operator join one group, so nesting grows with the number of operator
/// changes rather than with the array length. The first clause's operator is
/// ignored. Returns `None` for an empty array.
#[must_use]
pub fn legacy_to_tree(clauses: &[LegacyClause]) -> Option<ExpressionNode> {
    let (first, rest) = clauses.split_first()?;
    let seed = ExpressionNode::Clause(first.clause());
    Some(rest.iter().fold(seed, |acc, lc| {
        let operator = lc.operator.unwrap_or_default();
        let next = ExpressionNode::Clause(lc.clause());
        match acc {
            ExpressionNode::Group {
                operator: prev,
                mut children,
            } if prev == operator => {
                children.push(next);
                ExpressionNode::Group { operator, children }
            }
            acc => ExpressionNode::Group {
                operator,
                children: vec![acc, next],
            },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{all_of, any_of, clause};

    fn placed(device: &str, anchor: &str) -> CompiledExpr {
        CompiledExpr::Placed(Clause::new(device, anchor))
    }

    fn condition(check: &AimCheck) -> CompiledExpr {
        compile_condition(check, RuleLimits::default())
    }

    #[test]
    fn legacy_to_tree_folds_left() {
        let tree = legacy_to_tree(&[
            LegacyClause::new(Some(Operator::Or), "a", "x"),
            LegacyClause::new(Some(Operator::Or), "b", "y"),
            LegacyClause::new(Some(Operator::And), "c", "z"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            all_of(vec![
                any_of(vec![clause("a", "x"), clause("b", "y")]),
                clause("c", "z"),
            ])
        );
    }

    #[test]
    fn legacy_to_tree_single_and_empty() {
        assert_eq!(
            legacy_to_tree(&[LegacyClause::new(None, "a", "x")]),
            Some(clause("a", "x"))
        );
        assert_eq!(legacy_to_tree(&[]), None);
    }

    #[test]
    fn missing_operator_defaults_to_and() {
        let tree = legacy_to_tree(&[
            LegacyClause::new(None, "a", "x"),
            LegacyClause::new(None, "b", "y"),
        ])
        .unwrap();
        assert_eq!(tree, all_of(vec![clause("a", "x"), clause("b", "y")]));
    }

    #[test]
    fn legacy_to_tree_merges_same_operator_runs() {
        let tree = legacy_to_tree(&[
            LegacyClause::new(None, "a", "x"),
            LegacyClause::new(Some(Operator::Or), "b", "y"),
            LegacyClause::new(Some(Operator::Or), "c", "z"),
            LegacyClause::new(Some(Operator::And), "d", "w"),
            LegacyClause::new(None, "e", "v"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            all_of(vec![
                any_of(vec![clause("a", "x"), clause("b", "y"), clause("c", "z")]),
                clause("d", "w"),
                clause("e", "v"),
            ])
        );
    }

    #[test]
    fn long_same_operator_array_stays_flat() {
        let clauses: Vec<LegacyClause> = (0..100_000)
            .map(|i| LegacyClause::new(Some(Operator::Or), format!("d{i}"), "a"))
            .collect();
        let Some(ExpressionNode::Group { operator, children }) = legacy_to_tree(&clauses) else {
            panic!("expected a group");
        };
        assert_eq!(operator, Operator::Or);
        assert_eq!(children.len(), 100_000);
    }

    #[test]
    fn legacy_array_compiles_to_flat_fold() {
        let check = AimCheck::new("x").legacy(vec![
            LegacyClause::new(Some(Operator::Or), "a", "x"),
            LegacyClause::new(None, "b", ""),
            LegacyClause::new(Some(Operator::Or), "c", "z"),
        ]);
        assert_eq!(
            condition(&check),
            CompiledExpr::Fold(vec![
                (Operator::Or, placed("a", "x")),
                (Operator::And, CompiledExpr::Const(false)),
                (Operator::Or, placed("c", "z")),
            ])
        );
    }

    #[test]
    fn long_legacy_array_ignores_depth_limit() {
        let clauses: Vec<LegacyClause> = (0..6)
            .map(|i| LegacyClause::new(None, format!("d{i}"), "a"))
            .collect();
        let check = AimCheck::new("x").legacy(clauses);
        assert!(matches!(condition(&check), CompiledExpr::Fold(steps) if steps.len() == 6));
    }

    #[test]
    fn empty_group_is_const_true() {
        let check = AimCheck::new("x").tree(any_of(vec![]));
        assert_eq!(condition(&check), CompiledExpr::Const(true));
    }

    #[test]
    fn incomplete_clause_is_const_false() {
        let check = AimCheck::new("x").tree(clause("lamp", ""));
        assert_eq!(condition(&check), CompiledExpr::Const(false));
    }

    #[test]
    fn unknown_node_is_const_false() {
        let check = AimCheck::new("x").tree(ExpressionNode::Unknown);
        assert_eq!(condition(&check), CompiledExpr::Const(false));
    }

    #[test]
    fn overflowing_group_fails_closed() {
        let check = AimCheck::new("x").tree(all_of(vec![
            clause("a", "x"),
            any_of(vec![all_of(vec![clause("b", "y")])]),
        ]));
        assert_eq!(
            condition(&check),
            CompiledExpr::All(vec![
                placed("a", "x"),
                CompiledExpr::Any(vec![CompiledExpr::Const(false)]),
            ])
        );
    }

    #[test]
    fn raised_limit_allows_deeper_groups() {
        let nested = all_of(vec![any_of(vec![all_of(vec![clause("b", "y")])])]);
        let check = AimCheck::new("x").tree(nested);
        let compiled = compile_condition(&check, RuleLimits::new().max_group_depth(2));
        assert_eq!(
            compiled,
            CompiledExpr::All(vec![CompiledExpr::Any(vec![CompiledExpr::All(vec![
                placed("b", "y")
            ])])])
        );
    }

    #[test]
    fn required_placements_fallback() {
        let check = AimCheck::new("x")
            .required_placements(vec![Clause::new("a", "x"), Clause::new("b", "y")]);
        assert_eq!(
            condition(&check),
            CompiledExpr::All(vec![placed("a", "x"), placed("b", "y")])
        );
    }

    #[test]
    fn expression_takes_precedence_over_required_placements() {
        let check = AimCheck::new("x")
            .tree(clause("a", "x"))
            .required_placements(vec![Clause::new("b", "y")]);
        assert_eq!(condition(&check), placed("a", "x"));
    }

    #[test]
    fn empty_legacy_array_falls_back_to_required_placements() {
        let check = AimCheck::new("x")
            .legacy(vec![])
            .required_placements(vec![Clause::new("b", "y")]);
        assert_eq!(condition(&check), CompiledExpr::All(vec![placed("b", "y")]));

        assert_eq!(condition(&AimCheck::new("x").legacy(vec![])), CompiledExpr::Const(true));
    }

    #[test]
    fn nothing_stated_is_const_true() {
        assert_eq!(condition(&AimCheck::new("x")), CompiledExpr::Const(true));
    }
}
