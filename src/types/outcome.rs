use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Per-aim verdicts, in the order the checks were evaluated.
///
/// Behaves like a JSON object: a repeated aim id keeps the position of its
/// first occurrence and takes the most recent value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[must_use]
pub struct Outcome {
    entries: Vec<(String, bool)>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, aim_id: &str, passed: bool) {
        match self.entries.iter_mut().find(|(id, _)| id == aim_id) {
            Some(entry) => entry.1 = passed,
            None => self.entries.push((aim_id.to_owned(), passed)),
        }
    }

    /// Verdict for an aim, or `None` if no check carried that id.
    #[must_use]
    pub fn get(&self, aim_id: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(id, _)| id == aim_id)
            .map(|&(_, passed)| passed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(id, passed)| (id.as_str(), *passed))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every aim passed. An empty outcome passes.
    #[must_use]
    pub fn passed_all(&self) -> bool {
        self.entries.iter().all(|&(_, passed)| passed)
    }

    /// Ids of the aims that failed, in check order.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (id, passed)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{id}: {}", if *passed { "PASS" } else { "FAIL" })?;
        }
        Ok(())
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, passed) in &self.entries {
            map.serialize_entry(id, passed)?;
        }
        map.end()
    }
}
