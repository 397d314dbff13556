use std::fmt;

use serde::Serialize;

/// A group nested deeper than allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepthViolation {
    /// Dotted 0-based child indices from the root, e.g. `"0.2"`.
    pub path: String,
    pub depth: usize,
}

/// Result of [`validate_group_depth`](crate::validate_group_depth).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[must_use]
pub struct DepthReport {
    pub ok: bool,
    pub violations: Vec<DepthViolation>,
}

impl DepthReport {
    pub(crate) fn from_violations(violations: Vec<DepthViolation>) -> Self {
        Self {
            ok: violations.is_empty(),
            violations,
        }
    }

    /// Comma-separated violation paths.
    #[must_use]
    pub fn paths(&self) -> String {
        join_paths(&self.violations)
    }
}

/// Violations found in one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIssue {
    /// `None` when the check has no aim id.
    pub aim_id: Option<String>,
    /// 0-based position in `rules.checks`.
    pub index: usize,
    pub violations: Vec<DepthViolation>,
}

impl CheckIssue {
    #[must_use]
    pub fn paths(&self) -> String {
        join_paths(&self.violations)
    }
}

/// Aggregated structure validation over every check, with a message meant
/// for the scenario author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[must_use]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<CheckIssue>,
    pub message: String,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok {
            write!(f, "rules ok")
        } else {
            write!(f, "{}", self.message)
        }
    }
}

fn join_paths(violations: &[DepthViolation]) -> String {
    violations
        .iter()
        .map(|v| v.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
