//! Modifier aggregation.
//!
//! Character records carry modifiers in six per-category lists. The
//! calculators never read those lists directly: [`ModifierSet::collect`]
//! flattens them into one ordered collection of typed [`Modifier`]s, each
//! tagged with where it came from, and consumers pick the subset they
//! need through a [`GrantRule`].

use crate::ability::Ability;
use crate::record::{Character, RawModifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component type id of a class feature in modifier provenance.
pub const CLASS_FEATURE_COMPONENT: i64 = 12168134;

/// Where a modifier was granted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCategory {
    Race,
    Class,
    Background,
    Item,
    Feat,
    Condition,
}

impl SourceCategory {
    /// Aggregation order.
    pub const ALL: [SourceCategory; 6] = [
        SourceCategory::Race,
        SourceCategory::Class,
        SourceCategory::Background,
        SourceCategory::Item,
        SourceCategory::Feat,
        SourceCategory::Condition,
    ];

    /// Items and conditions only apply while active; the rest define the character.
    pub fn is_conditional(self) -> bool {
        matches!(self, SourceCategory::Item | SourceCategory::Condition)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceCategory::Race => "race",
            SourceCategory::Class => "class",
            SourceCategory::Background => "background",
            SourceCategory::Item => "item",
            SourceCategory::Feat => "feat",
            SourceCategory::Condition => "condition",
        }
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a modifier does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    Bonus { value: i32 },
    Proficiency,
    Expertise,
    Set { value: i32 },
    /// Any type the calculators do not interpret.
    Other(String),
}

/// Origin and activation state of a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub category: SourceCategory,
    pub component_id: Option<i64>,
    pub component_type_id: Option<i64>,
    pub is_granted: bool,
}

impl Provenance {
    /// Whether the modifier was granted by a class feature.
    pub fn is_class_feature(&self) -> bool {
        self.category == SourceCategory::Class
            || self.component_type_id == Some(CLASS_FEATURE_COMPONENT)
    }
}

/// A typed, immutable modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    /// Lower-cased key of what this modifier affects, e.g. `"dexterity-score"`.
    pub sub_type: String,
    /// Ability whose modifier is added on top of the value, if any.
    pub stat_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub provenance: Provenance,
}

impl Modifier {
    /// Type a raw modifier.
    ///
    /// The numeric payload is `value`, falling back to `fixedValue`, then 0.
    /// A missing `isGranted` counts as granted.
    pub fn from_raw(raw: &RawModifier, category: SourceCategory) -> Self {
        let amount = raw.value.or(raw.fixed_value).unwrap_or(0);
        let kind = match raw.kind.trim().to_ascii_lowercase().as_str() {
            "bonus" => ModifierKind::Bonus { value: amount },
            "proficiency" => ModifierKind::Proficiency,
            "expertise" => ModifierKind::Expertise,
            "set" => ModifierKind::Set { value: amount },
            other => ModifierKind::Other(other.to_string()),
        };

        Self {
            kind,
            sub_type: raw.sub_type.trim().to_ascii_lowercase(),
            stat_id: raw.stat_id,
            entity_id: raw.entity_id,
            provenance: Provenance {
                category,
                component_id: raw.component_id,
                component_type_id: raw.component_type_id,
                is_granted: raw.is_granted.unwrap_or(true),
            },
        }
    }

    pub fn category(&self) -> SourceCategory {
        self.provenance.category
    }

    /// The additive value of a `bonus` modifier.
    pub fn bonus_value(&self) -> Option<i32> {
        match self.kind {
            ModifierKind::Bonus { value } => Some(value),
            _ => None,
        }
    }

    pub fn set_value(&self) -> Option<i32> {
        match self.kind {
            ModifierKind::Set { value } => Some(value),
            _ => None,
        }
    }

    pub fn is_proficiency(&self) -> bool {
        self.kind == ModifierKind::Proficiency
    }

    pub fn is_expertise(&self) -> bool {
        self.kind == ModifierKind::Expertise
    }

    /// The ability referenced by `statId`, for bonuses that scale with a modifier.
    pub fn stat_ability(&self) -> Option<Ability> {
        self.stat_id.and_then(Ability::from_id)
    }

    /// Short breakdown label, e.g. `"item bonus (armor-class)"`.
    pub fn label(&self) -> String {
        let kind = match &self.kind {
            ModifierKind::Bonus { .. } => "bonus",
            ModifierKind::Proficiency => "proficiency",
            ModifierKind::Expertise => "expertise",
            ModifierKind::Set { .. } => "set",
            ModifierKind::Other(other) => other.as_str(),
        };
        format!("{} {} ({})", self.category(), kind, self.sub_type)
    }
}

/// Which modifiers a consumer counts as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantRule {
    /// Every modifier, granted or not.
    Any,
    /// Only modifiers flagged as granted.
    Granted,
    /// Items and conditions must be granted; other categories always count.
    Conditional,
}

impl GrantRule {
    pub fn admits(self, provenance: &Provenance) -> bool {
        match self {
            GrantRule::Any => true,
            GrantRule::Granted => provenance.is_granted,
            GrantRule::Conditional => {
                provenance.is_granted || !provenance.category.is_conditional()
            }
        }
    }
}

/// Every modifier on a character, in category order.
///
/// # Examples
///
/// ```rust
/// use charstat::{Character, GrantRule, ModifierSet};
///
/// let character = Character::from_json(r#"{
///     "modifiers": {
///         "race": [{"type": "bonus", "subType": "dexterity-score", "value": 2}],
///         "item": [{"type": "bonus", "subType": "dexterity-score", "value": 1, "isGranted": false}]
///     }
/// }"#).unwrap();
///
/// let set = ModifierSet::collect(&character);
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.bonus_total(GrantRule::Any, &["dexterity-score"]), 3);
/// assert_eq!(set.bonus_total(GrantRule::Conditional, &["dexterity-score"]), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierSet {
    modifiers: Vec<Modifier>,
}

impl ModifierSet {
    /// Flatten race, class, background, item, feat and condition lists, in that order.
    pub fn collect(character: &Character) -> Self {
        let lists = &character.modifiers;
        let mut modifiers = Vec::new();
        for category in SourceCategory::ALL {
            let raw = match category {
                SourceCategory::Race => &lists.race,
                SourceCategory::Class => &lists.class,
                SourceCategory::Background => &lists.background,
                SourceCategory::Item => &lists.item,
                SourceCategory::Feat => &lists.feat,
                SourceCategory::Condition => &lists.condition,
            };
            modifiers.extend(raw.iter().map(|m| Modifier::from_raw(m, category)));
        }
        Self { modifiers }
    }

    /// Build a set from raw modifiers of a single category.
    pub fn from_raw(raw: &[RawModifier], category: SourceCategory) -> Self {
        Self {
            modifiers: raw.iter().map(|m| Modifier::from_raw(m, category)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Modifiers admitted by `rule` whose `subType` is one of `keys`.
    pub fn matching<'a>(
        &'a self,
        rule: GrantRule,
        keys: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers.iter().filter(move |m| {
            rule.admits(&m.provenance) && keys.iter().any(|k| m.sub_type == *k)
        })
    }

    /// Admitted `bonus` modifiers for `keys`.
    pub fn bonuses<'a>(
        &'a self,
        rule: GrantRule,
        keys: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.matching(rule, keys).filter(|m| m.bonus_value().is_some())
    }

    pub fn bonus_total(&self, rule: GrantRule, keys: &[&str]) -> i32 {
        self.bonuses(rule, keys)
            .filter_map(Modifier::bonus_value)
            .fold(0, i32::saturating_add)
    }

    /// Highest `set` value for `keys`; ties resolve to the maximum.
    pub fn max_set(&self, rule: GrantRule, keys: &[&str]) -> Option<i32> {
        self.matching(rule, keys).filter_map(Modifier::set_value).max()
    }

    pub fn has_proficiency(&self, rule: GrantRule, key: &str) -> bool {
        self.matching(rule, &[key]).any(Modifier::is_proficiency)
    }

    pub fn has_expertise(&self, rule: GrantRule, key: &str) -> bool {
        self.matching(rule, &[key]).any(Modifier::is_expertise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn character(modifiers: serde_json::Value) -> Character {
        Character::from_value(json!({ "modifiers": modifiers })).unwrap()
    }

    #[test]
    fn test_collect_preserves_category_order() {
        let c = character(json!({
            "condition": [{"type": "bonus", "subType": "initiative", "value": 1}],
            "race": [{"type": "bonus", "subType": "initiative", "value": 2}],
            "feat": [{"type": "bonus", "subType": "initiative", "value": 5}],
        }));
        let set = ModifierSet::collect(&c);
        let categories: Vec<_> = set.iter().map(Modifier::category).collect();
        assert_eq!(
            categories,
            vec![SourceCategory::Race, SourceCategory::Feat, SourceCategory::Condition]
        );
    }

    #[test]
    fn test_value_falls_back_to_fixed_value() {
        let raw: RawModifier = serde_json::from_value(json!({
            "type": "Bonus", "subType": "Saving-Throws", "fixedValue": 3
        }))
        .unwrap();
        let m = Modifier::from_raw(&raw, SourceCategory::Item);
        assert_eq!(m.kind, ModifierKind::Bonus { value: 3 });
        assert_eq!(m.sub_type, "saving-throws");
        assert!(m.provenance.is_granted);
    }

    #[test]
    fn test_unknown_type_is_other() {
        let raw: RawModifier =
            serde_json::from_value(json!({"type": "advantage", "subType": "stealth"})).unwrap();
        let m = Modifier::from_raw(&raw, SourceCategory::Race);
        assert_eq!(m.kind, ModifierKind::Other("advantage".into()));
        assert_eq!(m.bonus_value(), None);
    }

    #[test]
    fn test_grant_rules() {
        let c = character(json!({
            "race": [{"type": "bonus", "subType": "strength-score", "value": 1, "isGranted": false}],
            "condition": [{"type": "bonus", "subType": "strength-score", "value": 4, "isGranted": false}],
            "feat": [{"type": "bonus", "subType": "strength-score", "value": 2}],
        }));
        let set = ModifierSet::collect(&c);
        let keys = ["strength-score"];
        assert_eq!(set.bonus_total(GrantRule::Any, &keys), 7);
        assert_eq!(set.bonus_total(GrantRule::Conditional, &keys), 3);
        assert_eq!(set.bonus_total(GrantRule::Granted, &keys), 2);
    }

    #[test]
    fn test_max_set_picks_highest() {
        let c = character(json!({
            "item": [
                {"type": "set", "subType": "strength-score", "value": 19},
                {"type": "set", "subType": "strength-score", "value": 21},
            ],
        }));
        let set = ModifierSet::collect(&c);
        assert_eq!(set.max_set(GrantRule::Conditional, &["strength-score"]), Some(21));
        assert_eq!(set.max_set(GrantRule::Conditional, &["dexterity-score"]), None);
    }

    #[test]
    fn test_label() {
        let c = character(json!({
            "item": [{"type": "bonus", "subType": "armor-class", "value": 1}],
        }));
        let set = ModifierSet::collect(&c);
        assert_eq!(set.iter().next().unwrap().label(), "item bonus (armor-class)");
    }
}
