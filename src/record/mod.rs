//! The raw character record.
//!
//! These types mirror the camelCase payload handed over by the fetch
//! collaborator. Every field is optional on the wire: collections default
//! to empty, numbers to zero, and identifiers that arrive as strings are
//! normalized to integers by the [`loose`] deserializers. Nothing here
//! interprets the data; that is the calculators' job.

pub mod loose;

use crate::error::SheetError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A full character record, read-only for the duration of a derivation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Character {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    #[serde(deserialize_with = "loose::or_default")]
    pub decorations: Decorations,
    #[serde(deserialize_with = "loose::or_default")]
    pub stats: Vec<StatEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub bonus_stats: Vec<StatEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub override_stats: Vec<StatEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub classes: Vec<ClassEntry>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub starting_class_id: Option<i64>,
    #[serde(deserialize_with = "loose::or_default")]
    pub modifiers: ModifierLists,
    #[serde(deserialize_with = "loose::int")]
    pub base_hit_points: i32,
    #[serde(deserialize_with = "loose::int")]
    pub bonus_hit_points: i32,
    #[serde(deserialize_with = "loose::opt_int")]
    pub override_hit_points: Option<i32>,
    #[serde(deserialize_with = "loose::int")]
    pub removed_hit_points: i32,
    #[serde(deserialize_with = "loose::int")]
    pub temporary_hit_points: i32,
    #[serde(deserialize_with = "loose::or_default")]
    pub inventory: Vec<Item>,
    #[serde(deserialize_with = "loose::or_default")]
    pub class_spells: Vec<ClassSpellList>,
    #[serde(deserialize_with = "loose::or_default")]
    pub spells: SpellLists,
    #[serde(deserialize_with = "loose::or_default")]
    pub actions: ActionLists,
    #[serde(deserialize_with = "loose::or_default")]
    pub custom_actions: Vec<ActionEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub spell_slots: Vec<SlotEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub pact_magic: Vec<SlotEntry>,
    pub spell_rules: Option<SpellRules>,
}

impl Character {
    /// Parse a character from JSON text.
    ///
    /// Accepts either the bare record or the `{ "data": { ... } }` envelope
    /// the character service wraps it in.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::Character;
    ///
    /// let c = Character::from_json(r#"{"data": {"name": "Ray", "classes": null}}"#).unwrap();
    /// assert_eq!(c.name, "Ray");
    /// assert!(c.classes.is_empty());
    /// ```
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build a character from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, SheetError> {
        let record = match value {
            Value::Object(mut map) if is_envelope(&map) => map.remove("data").unwrap_or_default(),
            other => other,
        };
        Ok(serde_json::from_value(record)?)
    }

    /// Sum of all class levels.
    pub fn total_level(&self) -> i32 {
        self.classes
            .iter()
            .fold(0, |sum, c| sum.saturating_add(c.level))
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.decorations.avatar_url.as_deref()
    }
}

fn is_envelope(map: &serde_json::Map<String, Value>) -> bool {
    matches!(map.get("data"), Some(Value::Object(_)))
        && !map.contains_key("classes")
        && !map.contains_key("stats")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Decorations {
    #[serde(deserialize_with = "loose::opt_string")]
    pub avatar_url: Option<String>,
}

/// One row of the `stats`/`bonusStats`/`overrideStats` arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatEntry {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::opt_int")]
    pub value: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassEntry {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::int")]
    pub level: i32,
    #[serde(deserialize_with = "loose::or_default")]
    pub definition: ClassDefinition,
    pub subclass_definition: Option<SubclassDefinition>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_starting_class: bool,
    #[serde(deserialize_with = "loose::or_default")]
    pub class_features: Vec<ClassFeature>,
}

impl ClassEntry {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.definition.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassDefinition {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    pub spell_rules: Option<SpellRules>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub spell_casting_ability_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubclassDefinition {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassFeature {
    #[serde(deserialize_with = "loose::or_default")]
    pub definition: FeatureDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureDefinition {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    #[serde(deserialize_with = "loose::int")]
    pub required_level: i32,
}

/// Slot maxima per character (or class) level: `level_spell_slots[level][spell_level - 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpellRules {
    #[serde(deserialize_with = "loose::or_default")]
    pub level_spell_slots: Vec<Vec<i32>>,
}

/// The six per-category modifier lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierLists {
    #[serde(deserialize_with = "loose::or_default")]
    pub race: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub class: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub background: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub item: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub feat: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub condition: Vec<RawModifier>,
}

/// A modifier exactly as the payload states it. See [`crate::modifier::Modifier`]
/// for the typed form the calculators use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawModifier {
    #[serde(rename = "type", deserialize_with = "loose::or_default")]
    pub kind: String,
    #[serde(deserialize_with = "loose::or_default")]
    pub sub_type: String,
    #[serde(deserialize_with = "loose::opt_int")]
    pub value: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub fixed_value: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub entity_id: Option<i64>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub stat_id: Option<i64>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub component_id: Option<i64>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub component_type_id: Option<i64>,
    pub is_granted: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Item {
    #[serde(deserialize_with = "loose::int")]
    pub id: i64,
    #[serde(deserialize_with = "loose::or_default")]
    pub equipped: bool,
    #[serde(deserialize_with = "loose::int")]
    pub quantity: i32,
    #[serde(deserialize_with = "loose::or_default")]
    pub definition: ItemDefinition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemDefinition {
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    #[serde(deserialize_with = "loose::or_default")]
    pub description: String,
    #[serde(deserialize_with = "loose::or_default")]
    pub filter_type: String,
    #[serde(deserialize_with = "loose::opt_string")]
    pub sub_type: Option<String>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub armor_class: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub armor_type_id: Option<i64>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_weapon: bool,
    #[serde(deserialize_with = "loose::opt_int")]
    pub attack_bonus: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub enhancement: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub enhancement_bonus: Option<i32>,
    #[serde(deserialize_with = "loose::or_default")]
    pub magic: bool,
    pub damage: Option<Dice>,
    #[serde(deserialize_with = "loose::opt_string")]
    pub damage_type: Option<String>,
    #[serde(deserialize_with = "loose::range")]
    pub range: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub attack_type: Option<i64>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_monk_weapon: bool,
    #[serde(deserialize_with = "loose::opt_int")]
    pub category_id: Option<i64>,
    #[serde(deserialize_with = "loose::or_default")]
    pub properties: Vec<Property>,
    #[serde(deserialize_with = "loose::or_default")]
    pub granted_modifiers: Vec<RawModifier>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_consumable: bool,
}

impl ItemDefinition {
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn dice_string(&self) -> Option<&str> {
        self.damage
            .as_ref()
            .and_then(|d| d.dice_string.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dice {
    #[serde(deserialize_with = "loose::opt_string")]
    pub dice_string: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activation {
    #[serde(deserialize_with = "loose::opt_int")]
    pub activation_type: Option<i64>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub activation_time: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLists {
    #[serde(deserialize_with = "loose::or_default")]
    pub race: Vec<ActionEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub class: Vec<ActionEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub feat: Vec<ActionEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub item: Vec<ActionEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionEntry {
    #[serde(deserialize_with = "loose::opt_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    pub snippet: Option<String>,
    pub description: Option<String>,
    pub activation: Option<Activation>,
    pub limited_use: Option<LimitedUse>,
    #[serde(deserialize_with = "loose::range")]
    pub range: Option<i32>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_proficient: bool,
    #[serde(deserialize_with = "loose::opt_int")]
    pub attack_bonus_modifier_total: Option<i32>,
    pub dice: Option<Dice>,
    #[serde(deserialize_with = "loose::or_default")]
    pub is_attack: bool,
    #[serde(deserialize_with = "loose::opt_int")]
    pub ability_modifier_stat_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitedUse {
    #[serde(deserialize_with = "loose::int")]
    pub max_uses: i32,
    #[serde(deserialize_with = "loose::int")]
    pub number_used: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellLists {
    #[serde(deserialize_with = "loose::or_default")]
    pub race: Vec<SpellEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub class: Vec<SpellEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub background: Vec<SpellEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub item: Vec<SpellEntry>,
    #[serde(deserialize_with = "loose::or_default")]
    pub feat: Vec<SpellEntry>,
}

/// Spells granted through one class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassSpellList {
    #[serde(deserialize_with = "loose::opt_int")]
    pub character_class_id: Option<i64>,
    pub name: Option<String>,
    pub definition: Option<SubclassDefinition>,
    #[serde(deserialize_with = "loose::or_default")]
    pub spells: Vec<SpellEntry>,
}

impl ClassSpellList {
    pub fn class_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or_else(|| self.definition.as_ref().map(|d| d.name.as_str()))
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpellEntry {
    pub prepared: Option<bool>,
    #[serde(deserialize_with = "loose::or_default")]
    pub always_prepared: bool,
    pub definition: Option<SpellDefinition>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpellDefinition {
    #[serde(deserialize_with = "loose::or_default")]
    pub name: String,
    #[serde(deserialize_with = "loose::int")]
    pub level: i32,
    pub school: Option<String>,
    pub activation: Option<Activation>,
    pub range: Option<SpellRange>,
    #[serde(deserialize_with = "loose::components")]
    pub components: Vec<String>,
    #[serde(deserialize_with = "loose::or_default")]
    pub description: String,
    #[serde(deserialize_with = "loose::or_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub attack_type: Option<i64>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub save_dc_ability_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpellRange {
    #[serde(deserialize_with = "loose::opt_int")]
    pub range_value: Option<i32>,
    pub origin: Option<String>,
}

/// One slot row from `spellSlots` or `pactMagic`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SlotEntry {
    #[serde(deserialize_with = "loose::opt_int")]
    pub level: Option<i32>,
    #[serde(deserialize_with = "loose::int")]
    pub used: i32,
    #[serde(deserialize_with = "loose::opt_int")]
    pub max: Option<i32>,
    #[serde(deserialize_with = "loose::opt_int")]
    pub available: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_record_defaults() {
        let c = Character::from_value(json!({})).unwrap();
        assert_eq!(c.total_level(), 0);
        assert!(c.inventory.is_empty());
        assert!(c.modifiers.condition.is_empty());
        assert_eq!(c.override_hit_points, None);
    }

    #[test]
    fn test_envelope_is_unwrapped() {
        let c = Character::from_value(json!({
            "success": true,
            "data": {"id": "42", "name": "Remmy", "classes": [{"level": 3}]}
        }))
        .unwrap();
        assert_eq!(c.id, 42);
        assert_eq!(c.name, "Remmy");
        assert_eq!(c.total_level(), 3);
    }

    #[test]
    fn test_null_collections_tolerated() {
        let c = Character::from_value(json!({
            "stats": null,
            "modifiers": {"race": null, "item": [{"type": "bonus", "subType": "armor-class", "value": "1"}]},
            "spells": {"race": null},
            "bonusHitPoints": null
        }))
        .unwrap();
        assert!(c.stats.is_empty());
        assert_eq!(c.bonus_hit_points, 0);
        assert_eq!(c.modifiers.item[0].value, Some(1));
        assert_eq!(c.modifiers.item[0].is_granted, None);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Character::from_json("{not json").unwrap_err();
        assert!(matches!(err, SheetError::Parse(_)));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = Character::from_value(json!({"classes": "Fighter"})).unwrap_err();
        assert!(matches!(err, SheetError::Parse(_)));
    }

    #[test]
    fn test_item_attack_bonus_accepts_string() {
        let item: Item = serde_json::from_value(json!({
            "equipped": true,
            "definition": {"name": "Longsword +1", "attackBonus": "1", "range": {"rangeValue": 5}}
        }))
        .unwrap();
        assert_eq!(item.definition.attack_bonus, Some(1));
        assert_eq!(item.definition.range, Some(5));
    }
}
