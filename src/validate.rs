//! Structural validation of rule expression trees.
//!
//! The rule editor can only render one level of subgroups, so deeper trees
//! are reported here before a scenario is played. Legacy clause arrays and
//! single clauses have no groups and always pass.

use tracing::{debug, instrument};

use crate::{AimCheck, CheckIssue, DepthReport, DepthViolation, ExpressionNode, ValidationReport};

/// Author-facing strings used by [`validate_all_checks_with`].
///
/// Implement this to localize the report message; the report keeps the same
/// structure (one sentence per issue, then a summary).
pub trait Messages {
    /// Sentence for a check that has an aim id. `paths` is comma-separated.
    fn aim_issue(&self, aim_id: &str, paths: &str) -> String;

    /// Sentence for a check without an aim id. `number` is 1-based.
    fn check_issue(&self, number: usize, paths: &str) -> String;

    /// Placeholder used when an issue carries no paths.
    fn unknown_location(&self) -> String;

    /// Closing sentence stating the depth ceiling.
    fn depth_summary(&self, max_depth: usize) -> String;
}

/// Default English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Messages for English {
    fn aim_issue(&self, aim_id: &str, paths: &str) -> String {
        format!("Aim \"{aim_id}\" has unsupported nested groups ({paths}).")
    }

    fn check_issue(&self, number: usize, paths: &str) -> String {
        format!("Check {number} has unsupported nested groups ({paths}).")
    }

    fn unknown_location(&self) -> String {
        "unknown location".to_owned()
    }

    fn depth_summary(&self, max_depth: usize) -> String {
        match max_depth {
            0 => "Rules currently do not support subgroups.".to_owned(),
            1 => "Rules currently support at most one level of subgroups.".to_owned(),
            n => format!("Rules currently support at most {n} levels of subgroups."),
        }
    }
}

/// Report every group nested deeper than `max_depth` below `node`.
///
/// The root is depth 0 and only group children add depth. Once a group is
/// reported its subtree is not inspected, so each branch yields at most one
/// violation. A missing node or a non-group root is always ok.
pub fn validate_group_depth(node: Option<&ExpressionNode>, max_depth: usize) -> DepthReport {
    let mut violations = Vec::new();
    if let Some(root) = node {
        if root.is_group() {
            walk_group(root, 0, "root", max_depth, &mut violations);
        }
    }
    DepthReport::from_violations(violations)
}

fn walk_group(
    node: &ExpressionNode,
    depth: usize,
    path: &str,
    max_depth: usize,
    violations: &mut Vec<DepthViolation>,
) {
    let ExpressionNode::Group { children, .. } = node else {
        return;
    };
    if depth > max_depth {
        violations.push(DepthViolation {
            path: path.to_owned(),
            depth,
        });
        return;
    }
    for (index, child) in children.iter().enumerate() {
        if child.is_group() {
            let next = if path == "root" {
                index.to_string()
            } else {
                format!("{path}.{index}")
            };
            walk_group(child, depth + 1, &next, max_depth, violations);
        }
    }
}

/// Validate every check's tree expression and build an English report.
pub fn validate_all_checks(checks: &[AimCheck], max_depth: usize) -> ValidationReport {
    validate_all_checks_with(checks, max_depth, &English)
}

/// [`validate_all_checks`] with caller-supplied message strings.
#[instrument(level = "debug", skip_all, fields(checks = checks.len(), max_depth = max_depth))]
pub fn validate_all_checks_with(
    checks: &[AimCheck],
    max_depth: usize,
    messages: &impl Messages,
) -> ValidationReport {
    let issues: Vec<CheckIssue> = checks
        .iter()
        .enumerate()
        .filter_map(|(index, check)| {
            let report = validate_group_depth(check.tree_root(), max_depth);
            (!report.ok).then(|| CheckIssue {
                aim_id: (!check.aim_id.is_empty()).then(|| check.aim_id.clone()),
                index,
                violations: report.violations,
            })
        })
        .collect();

    if issues.is_empty() {
        return ValidationReport {
            ok: true,
            issues,
            message: String::new(),
        };
    }

    debug!(issues = issues.len(), "unsupported nested groups found");

    let mut sentences: Vec<String> = issues
        .iter()
        .map(|issue| {
            let mut paths = issue.paths();
            if paths.is_empty() {
                paths = messages.unknown_location();
            }
            match &issue.aim_id {
                Some(aim_id) => messages.aim_issue(aim_id, &paths),
                None => messages.check_issue(issue.index + 1, &paths),
            }
        })
        .collect();
    sentences.push(messages.depth_summary(max_depth));

    ValidationReport {
        ok: false,
        issues,
        message: sentences.join(" "),
    }
}
