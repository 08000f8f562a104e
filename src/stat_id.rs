//! Stat identifier module.
//!
//! Provides the `StatId` type, an interned string identifier for every
//! derived number on a sheet. Well-known stats are named after the
//! modifier `subType` keys that feed them (`"strength-score"`,
//! `"wisdom-saving-throws"`, `"armor-class"`), so a breakdown reads the
//! same way the raw data does.

use crate::ability::{Ability, Skill};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Resolved stat values are whole numbers.
pub type StatValue = i32;

/// Interned string identifier for stats.
///
/// Uses `Arc<str>` so clones are cheap and comparisons are fast.
///
/// # Examples
///
/// ```rust
/// use charstat::{Ability, StatId};
///
/// let str_score = StatId::score(Ability::Strength);
/// assert_eq!(str_score.as_str(), "strength-score");
///
/// let ac: StatId = "armor-class".into();
/// assert_eq!(ac, StatId::armor_class());
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct StatId(Arc<str>);

impl Serialize for StatId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StatId::from(s))
    }
}

impl StatId {
    /// Create a new `StatId` from a string slice.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the string representation of this `StatId`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final score of an ability, e.g. `"dexterity-score"`.
    pub fn score(ability: Ability) -> Self {
        Self::from(ability.score_key())
    }

    /// The modifier derived from an ability score, e.g. `"dexterity-modifier"`.
    pub fn modifier(ability: Ability) -> Self {
        Self::from(format!("{}-modifier", ability.key()))
    }

    /// The saving throw bonus for an ability, e.g. `"wisdom-saving-throws"`.
    pub fn saving_throw(ability: Ability) -> Self {
        Self::from(ability.save_key())
    }

    /// The bonus for a skill, e.g. `"sleight-of-hand"`.
    pub fn skill(skill: Skill) -> Self {
        Self::from(skill.sub_type())
    }

    /// The passive score for a skill, e.g. `"passive-perception"`.
    pub fn passive(skill: Skill) -> Self {
        Self::from(format!("passive-{}", skill.sub_type()))
    }

    pub fn total_level() -> Self {
        Self::from_str("total-level")
    }

    pub fn proficiency_bonus() -> Self {
        Self::from_str("proficiency-bonus")
    }

    pub fn armor_class() -> Self {
        Self::from_str("armor-class")
    }

    pub fn initiative() -> Self {
        Self::from_str("initiative")
    }

    pub fn hit_points_max() -> Self {
        Self::from_str("hit-points-max")
    }

    pub fn hit_points_current() -> Self {
        Self::from_str("hit-points-current")
    }

    pub fn hit_points_temp() -> Self {
        Self::from_str("hit-points-temp")
    }
}

impl From<&str> for StatId {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for StatId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for StatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_id_creation() {
        let id1 = StatId::from_str("armor-class");
        let id2 = StatId::armor_class();
        assert_eq!(id1, id2);
        assert_eq!(id1.as_str(), "armor-class");
    }

    #[test]
    fn test_named_constructors() {
        assert_eq!(StatId::score(Ability::Charisma).as_str(), "charisma-score");
        assert_eq!(
            StatId::modifier(Ability::Constitution).as_str(),
            "constitution-modifier"
        );
        assert_eq!(
            StatId::saving_throw(Ability::Wisdom).as_str(),
            "wisdom-saving-throws"
        );
        assert_eq!(StatId::skill(Skill::AnimalHandling).as_str(), "animal-handling");
        assert_eq!(
            StatId::passive(Skill::Perception).as_str(),
            "passive-perception"
        );
    }

    #[test]
    fn test_stat_id_serde_is_plain_string() {
        let id = StatId::initiative();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"initiative\"");
        let back: StatId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
