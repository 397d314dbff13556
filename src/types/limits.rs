/// Deepest group nesting the rule editor can render: the root group's
/// children may be groups, their children may not.
pub const MAX_RULE_GROUP_DEPTH: usize = 1;

/// Structural limits applied when compiling and validating rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleLimits {
    max_group_depth: usize,
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self {
            max_group_depth: MAX_RULE_GROUP_DEPTH,
        }
    }
}

impl RuleLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth;
        self
    }

    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.max_group_depth
    }
}
