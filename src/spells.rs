//! The spell list.

use crate::ability::{signed, Ability};
use crate::actions::{compare_names, ActivationKind};
use crate::record::{Character, ClassEntry, ClassSpellList, SpellDefinition, SpellEntry};
use crate::scope::StatScope;
use crate::summon::{parse_summon_stats, SummonStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::trace;

/// Classes that choose a prepared subset of their known spells.
pub const PREPARED_CASTERS: [&str; 5] = ["Cleric", "Druid", "Wizard", "Paladin", "Artificer"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spell {
    pub name: String,
    pub level: i32,
    pub school: String,
    /// e.g. "1 Bonus Action".
    pub casting_time: String,
    pub casting_type: ActivationKind,
    pub range: String,
    pub components: String,
    pub description: String,
    pub source: String,
    pub hit_or_dc: String,
    pub damage: String,
    pub attack_type: String,
    pub tags: Vec<String>,
    pub summon: Option<SummonStats>,
}

/// Summon statblocks keyed by spell name, parsed once per derivation pass.
pub type SummonCache = BTreeMap<String, SummonStats>;

/// Parse the statblock of every spell on the character that carries one.
pub fn collect_summons(character: &Character) -> SummonCache {
    let mut cache = SummonCache::new();
    let mut seen = std::collections::HashSet::new();
    for definition in all_entries(character).filter_map(|(entry, _)| entry.definition.as_ref()) {
        if !seen.insert(definition.name.as_str()) {
            continue;
        }
        if let Some(stats) = parse_summon_stats(&definition.description) {
            trace!(spell = %definition.name, "summon statblock");
            cache.insert(definition.name.clone(), stats);
        }
    }
    cache
}

/// Whether a class chooses prepared spells.
pub fn is_prepared_caster(class_name: &str) -> bool {
    PREPARED_CASTERS.iter().any(|c| class_name.contains(c))
}

/// Where a spell list came from.
#[derive(Debug, Clone, Copy)]
enum ListOwner<'a> {
    Class(&'a ClassSpellList),
    Race,
    Feat,
    Item,
}

fn all_entries(character: &Character) -> impl Iterator<Item = (&SpellEntry, ListOwner<'_>)> {
    let class_lists = character
        .class_spells
        .iter()
        .flat_map(|list| list.spells.iter().map(move |e| (e, ListOwner::Class(list))));
    let granted = [
        (&character.spells.race, ListOwner::Race),
        (&character.spells.feat, ListOwner::Feat),
        (&character.spells.item, ListOwner::Item),
    ]
    .into_iter()
    .flat_map(|(entries, owner)| entries.iter().map(move |e| (e, owner)));
    class_lists.chain(granted)
}

/// Build the sorted spell list, reusing statblocks from `summons`.
pub fn build_spells<S: StatScope + ?Sized>(
    character: &Character,
    scope: &S,
    summons: &SummonCache,
) -> Vec<Spell> {
    let mut spells: Vec<Spell> = all_entries(character)
        .filter_map(|(entry, owner)| {
            let definition = entry.definition.as_ref()?;
            let (source, class) = match owner {
                ListOwner::Class(list) => {
                    let name = list.class_name().unwrap_or("Class");
                    if is_prepared_caster(name) && entry.prepared == Some(false) && !entry.always_prepared {
                        trace!(spell = %definition.name, class = name, "unprepared spell skipped");
                        return None;
                    }
                    (name, owning_class(character, list))
                }
                ListOwner::Race => ("Race", None),
                ListOwner::Feat => ("Feat", None),
                ListOwner::Item => ("Item", None),
            };
            let casting_ability = class
                .and_then(|c| c.definition.spell_casting_ability_id)
                .and_then(Ability::from_id);
            Some(spell(definition, source, casting_ability, scope, summons))
        })
        .collect();

    spells.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| compare_names(&a.name, &b.name)));
    spells
}

/// The class entry a class spell list belongs to.
fn owning_class<'a>(character: &'a Character, list: &ClassSpellList) -> Option<&'a ClassEntry> {
    let by_id = list
        .character_class_id
        .and_then(|id| character.classes.iter().find(|c| c.id == id));
    by_id.or_else(|| {
        let name = list.class_name()?;
        character.classes.iter().find(|c| c.is_named(name))
    })
}

fn spell<S: StatScope + ?Sized>(
    definition: &SpellDefinition,
    source: &str,
    casting_ability: Option<Ability>,
    scope: &S,
    summons: &SummonCache,
) -> Spell {
    let casting_type = ActivationKind::of(definition.activation.as_ref());
    let casting_time = match definition.activation.as_ref().and_then(|a| a.activation_time) {
        Some(time) if time > 0 => format!("{time} {}", casting_type.label()),
        _ => casting_type.label().to_string(),
    };

    let is_save = definition.save_dc_ability_id.is_some();
    let attack_type = if is_save {
        "Save"
    } else {
        match definition.attack_type {
            Some(1) => "Melee Spell",
            Some(2) => "Ranged Spell",
            _ => "Spell",
        }
    };

    let hit_or_dc = match casting_ability {
        Some(ability) => {
            let bonus = scope
                .proficiency_bonus()
                .saturating_add(scope.ability_modifier(ability));
            if is_save {
                format!("DC {}", bonus.saturating_add(8))
            } else if matches!(definition.attack_type, Some(1 | 2)) {
                signed(bonus)
            } else {
                String::new()
            }
        }
        None => String::new(),
    };

    let range = match &definition.range {
        Some(range) if range.range_value.is_some_and(|v| v > 0) => {
            format!("{}ft", range.range_value.unwrap_or_default())
        }
        Some(range) => range.origin.clone().unwrap_or_else(|| "Self".to_string()),
        None => "Self".to_string(),
    };

    let damage = if definition.tags.iter().any(|t| t == "Damage") {
        "Dmg".to_string()
    } else {
        String::new()
    };

    Spell {
        name: definition.name.clone(),
        level: definition.level,
        school: definition
            .school
            .clone()
            .unwrap_or_else(|| "Magic".to_string()),
        casting_time,
        casting_type,
        range,
        components: definition.components.join(", "),
        description: definition.description.clone(),
        source: source.to_string(),
        hit_or_dc,
        damage,
        attack_type: attack_type.to_string(),
        tags: definition.tags.clone(),
        summon: summons.get(&definition.name).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Scope;

    impl StatScope for Scope {
        fn proficiency_bonus(&self) -> i32 {
            3
        }

        fn total_level(&self) -> i32 {
            5
        }

        fn class_level(&self, _class_name: &str) -> Option<i32> {
            Some(5)
        }

        fn ability_modifier(&self, ability: Ability) -> i32 {
            if ability == Ability::Intelligence {
                4
            } else {
                0
            }
        }
    }

    fn wizard() -> Character {
        Character::from_value(json!({
            "classes": [{"id": 11, "level": 5,
                "definition": {"name": "Wizard", "spellCastingAbilityId": 4}}],
            "classSpells": [{"characterClassId": 11, "spells": [
                {"prepared": true, "definition": {
                    "name": "Fireball", "level": 3, "school": "Evocation",
                    "activation": {"activationType": 1, "activationTime": 1},
                    "range": {"origin": "Ranged", "rangeValue": 150},
                    "components": [1, 2, 3], "tags": ["Damage"], "saveDcAbilityId": 2
                }},
                {"prepared": false, "definition": {"name": "Shield", "level": 1}},
                {"prepared": false, "alwaysPrepared": true, "definition": {
                    "name": "Fire Bolt", "level": 0, "attackType": 2,
                    "activation": {"activationType": 1, "activationTime": 1}
                }},
                {"prepared": true}
            ]}],
            "spells": {"race": [{"definition": {
                "name": "Misty Step", "level": 2,
                "activation": {"activationType": 3, "activationTime": 1},
                "range": {"origin": "Self"}
            }}]}
        }))
        .unwrap()
    }

    #[test]
    fn test_prepared_filter_and_order() {
        let spells = build_spells(&wizard(), &Scope, &SummonCache::new());
        let names: Vec<_> = spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Fire Bolt", "Misty Step", "Fireball"]);
    }

    #[test]
    fn test_spell_fields() {
        let spells = build_spells(&wizard(), &Scope, &SummonCache::new());
        let fireball = spells.iter().find(|s| s.name == "Fireball").unwrap();
        assert_eq!(fireball.casting_time, "1 Action");
        assert_eq!(fireball.range, "150ft");
        assert_eq!(fireball.components, "V, S, M");
        assert_eq!(fireball.attack_type, "Save");
        assert_eq!(fireball.hit_or_dc, "DC 15");
        assert_eq!(fireball.damage, "Dmg");
        assert_eq!(fireball.source, "Wizard");

        let bolt = spells.iter().find(|s| s.name == "Fire Bolt").unwrap();
        assert_eq!(bolt.attack_type, "Ranged Spell");
        assert_eq!(bolt.hit_or_dc, "+7");
        assert_eq!(bolt.school, "Magic");
        assert_eq!(bolt.range, "Self");

        let step = spells.iter().find(|s| s.name == "Misty Step").unwrap();
        assert_eq!(step.casting_time, "1 Bonus Action");
        assert_eq!(step.source, "Race");
        assert_eq!(step.hit_or_dc, "");
    }

    #[test]
    fn test_spontaneous_casters_show_everything() {
        let c = Character::from_value(json!({
            "classSpells": [{"name": "Sorcerer", "spells": [
                {"prepared": false, "definition": {"name": "Shield", "level": 1}}
            ]}]
        }))
        .unwrap();
        assert_eq!(build_spells(&c, &Scope, &SummonCache::new()).len(), 1);
        assert!(is_prepared_caster("Cleric"));
        assert!(!is_prepared_caster("Warlock"));
    }

    #[test]
    fn test_summons_are_cached_by_name() {
        let c = Character::from_value(json!({
            "spells": {"feat": [{"definition": {
                "name": "Find Familiar", "level": 1,
                "description": "<p>Armor Class 13</p><p>Hit Points 1</p>"
            }}]}
        }))
        .unwrap();
        let summons = collect_summons(&c);
        assert_eq!(summons.len(), 1);
        let spells = build_spells(&c, &Scope, &summons);
        assert_eq!(spells[0].summon.as_ref().map(|s| s.hp.as_str()), Some("1"));
        assert!(build_spells(&c, &Scope, &SummonCache::new())[0].summon.is_none());
    }
}
