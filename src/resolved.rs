//! Resolved stat results module.
//!
//! Contains the `ResolvedStat` type, a fully resolved stat value with its
//! breakdown, and `StatTable`, the set of every stat resolved in one
//! derivation pass.

use crate::stat_id::{StatId, StatValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resolved stat value with full breakdown information.
///
/// # Examples
///
/// ```rust
/// use charstat::{ResolvedStat, StatId};
///
/// let mut resolved = ResolvedStat::new(StatId::armor_class(), 16);
/// resolved.add_source("base", 10);
/// resolved.add_transform("+ dexterity-modifier", 13);
/// resolved.add_transform("item bonus (armor-class)", 16);
///
/// assert_eq!(resolved.sources.len(), 1);
/// assert_eq!(resolved.transforms.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedStat {
    pub stat_id: StatId,

    pub value: StatValue,

    /// Each entry is `(source_label, value)`, in registration order.
    pub sources: Vec<(String, StatValue)>,

    /// Each entry is `(transform_description, value_after_transform)`,
    /// in the order they were applied.
    pub transforms: Vec<(String, StatValue)>,
}

impl ResolvedStat {
    pub fn new(stat_id: StatId, value: StatValue) -> Self {
        Self {
            stat_id,
            value,
            sources: Vec::new(),
            transforms: Vec::new(),
        }
    }

    pub fn add_source(&mut self, description: impl Into<String>, value: StatValue) {
        self.sources.push((description.into(), value));
    }

    pub fn add_transform(&mut self, description: impl Into<String>, value: StatValue) {
        self.transforms.push((description.into(), value));
    }

    /// One line per contribution, for debugging output.
    pub fn explain(&self) -> String {
        let mut lines = vec![format!("{} = {}", self.stat_id, self.value)];
        for (label, value) in &self.sources {
            lines.push(format!("  {label}: {value}"));
        }
        for (label, value) in &self.transforms {
            lines.push(format!("  {label} -> {value}"));
        }
        lines.join("\n")
    }
}

/// Every stat resolved in a single pass, keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatTable {
    stats: BTreeMap<StatId, ResolvedStat>,
}

impl StatTable {
    pub fn insert(&mut self, resolved: ResolvedStat) {
        self.stats.insert(resolved.stat_id.clone(), resolved);
    }

    pub fn get(&self, stat_id: &StatId) -> Option<&ResolvedStat> {
        self.stats.get(stat_id)
    }

    /// The value of a stat, or 0 if it was never resolved.
    pub fn value(&self, stat_id: &StatId) -> StatValue {
        self.get(stat_id).map(|r| r.value).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedStat> {
        self.stats.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_stat_breakdown_order() {
        let mut stat = ResolvedStat::new(StatId::initiative(), 4);
        stat.add_source("race bonus (initiative)", 1);
        stat.add_source("feat bonus (initiative)", 2);
        stat.add_transform("+ dexterity-modifier", 4);

        assert_eq!(stat.sources[0].0, "race bonus (initiative)");
        assert_eq!(stat.sources[1].0, "feat bonus (initiative)");
        assert_eq!(stat.transforms.len(), 1);
    }

    #[test]
    fn test_explain() {
        let mut stat = ResolvedStat::new(StatId::armor_class(), 12);
        stat.add_source("base", 10);
        stat.add_transform("+ dexterity-modifier", 12);
        assert_eq!(
            stat.explain(),
            "armor-class = 12\n  base: 10\n  + dexterity-modifier -> 12"
        );
    }

    #[test]
    fn test_table_lookup() {
        let mut table = StatTable::default();
        table.insert(ResolvedStat::new(StatId::proficiency_bonus(), 3));

        assert_eq!(table.value(&StatId::proficiency_bonus()), 3);
        assert_eq!(table.value(&StatId::initiative()), 0);
        assert!(table.get(&StatId::initiative()).is_none());
        assert_eq!(table.len(), 1);
    }
}
