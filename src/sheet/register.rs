//! Stat registrations for one character.
//!
//! Every derived number on the sheet is a stat in the resolver graph. This
//! module turns record fields and modifiers into sources and transforms;
//! the resolver then evaluates them in dependency order.

use crate::ability::{Ability, ProficiencyLevel, Skill};
use crate::armor::{ArmorState, BodyArmor, MEDIUM_DEX_CAP};
use crate::modifier::{GrantRule, Modifier, ModifierSet};
use crate::provenance::ClassRoster;
use crate::record::{Character, StatEntry};
use crate::resolver::StatResolver;
use crate::source::{ConstantSource, ModifierSource};
use crate::stat_id::StatId;
use crate::transform::{
    AbilityModifierTransform, BoundedTransform, ClampTransform, OverrideTransform,
    ProficiencyBonusTransform, ScalingTransform,
};

/// Grant rule for ability score modifiers.
pub const SCORE_GRANT_RULE: GrantRule = if cfg!(feature = "strict-grants") {
    GrantRule::Granted
} else {
    GrantRule::Conditional
};

/// Grant rule for skill modifiers.
pub const SKILL_GRANT_RULE: GrantRule = GrantRule::Conditional;

/// Global saving-throw bonus keys, applied to every save.
pub const GLOBAL_SAVE_KEYS: [&str; 3] = ["saving-throws", "saving-throws-bonus", "saving-throw-bonus"];

/// Skills that have a passive score.
pub const PASSIVE_SKILLS: [Skill; 3] = [Skill::Perception, Skill::Insight, Skill::Investigation];

/// Score assumed when a record has no base value for an ability.
pub const DEFAULT_SCORE: i32 = 10;

pub(crate) struct Registrar<'a> {
    resolver: StatResolver,
    character: &'a Character,
    modifiers: &'a ModifierSet,
    roster: ClassRoster<'a>,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(
        character: &'a Character,
        modifiers: &'a ModifierSet,
        roster: ClassRoster<'a>,
    ) -> Self {
        Self {
            resolver: StatResolver::new(),
            character,
            modifiers,
            roster,
        }
    }

    /// Register every stat on the sheet.
    pub(crate) fn register_all(mut self) -> StatResolver {
        self.level_and_proficiency();
        for ability in Ability::ALL {
            self.ability(ability);
        }
        for skill in Skill::ALL {
            self.skill(skill);
        }
        for skill in PASSIVE_SKILLS {
            self.passive(skill);
        }
        for ability in Ability::ALL {
            self.saving_throw(ability);
        }
        self.initiative();
        self.armor_class();
        self.hit_points();
        self.resolver
    }

    fn constant(&mut self, stat: &StatId, label: impl Into<String>, value: i32) {
        self.resolver
            .register_source(stat.clone(), Box::new(ConstantSource::new(label, value)));
    }

    fn plus(&mut self, stat: &StatId, dependency: StatId, factor: i32) {
        self.resolver
            .register_transform(stat.clone(), Box::new(ScalingTransform::new(dependency, factor)));
    }

    fn bonus_sources<'m>(&mut self, stat: &StatId, bonuses: impl Iterator<Item = &'m Modifier>) {
        for modifier in bonuses {
            self.resolver
                .register_source(stat.clone(), Box::new(ModifierSource::new(modifier)));
            if let Some(ability) = modifier.stat_ability() {
                self.plus(stat, StatId::modifier(ability), 1);
            }
        }
    }

    fn level_and_proficiency(&mut self) {
        let level = StatId::total_level();
        if self.roster.classes().is_empty() {
            self.constant(&level, "no class levels", 0);
        }
        for class in self.roster.classes() {
            self.constant(&level, format!("{} {}", class.name(), class.level), class.level);
        }
        self.resolver.register_transform(
            StatId::proficiency_bonus(),
            Box::new(ProficiencyBonusTransform::new(level)),
        );
    }

    fn ability(&mut self, ability: Ability) {
        let score = StatId::score(ability);
        let base = stat_value(&self.character.stats, ability).unwrap_or(DEFAULT_SCORE);
        self.constant(&score, "base", base);
        if let Some(bonus) = stat_value(&self.character.bonus_stats, ability) {
            self.constant(&score, "bonus", bonus);
        }

        let score_key = ability.score_key();
        let keys = [score_key.as_str(), ability.key()];
        let modifiers = self.modifiers;
        for modifier in modifiers.bonuses(SCORE_GRANT_RULE, &keys) {
            self.resolver
                .register_source(score.clone(), Box::new(ModifierSource::new(modifier)));
        }
        if let Some(set) = modifiers.max_set(SCORE_GRANT_RULE, &keys) {
            self.resolver
                .register_transform(score.clone(), Box::new(ClampTransform::with_min(set)));
        }
        if let Some(value) = stat_value(&self.character.override_stats, ability) {
            self.resolver
                .register_transform(score.clone(), Box::new(OverrideTransform::new(value)));
        }

        self.resolver.register_transform(
            StatId::modifier(ability),
            Box::new(AbilityModifierTransform::new(score)),
        );
    }

    fn skill(&mut self, skill: Skill) {
        let stat = StatId::skill(skill);
        let key = skill.sub_type();
        let modifiers = self.modifiers;

        self.plus(&stat, StatId::modifier(skill.ability()), 1);
        let level = skill_proficiency(modifiers, skill);
        if level != ProficiencyLevel::None {
            self.plus(&stat, StatId::proficiency_bonus(), level.multiplier());
        }
        let keys = [key.as_str()];
        for modifier in modifiers.bonuses(SKILL_GRANT_RULE, &keys) {
            self.resolver
                .register_source(stat.clone(), Box::new(ModifierSource::new(modifier)));
        }
    }

    fn passive(&mut self, skill: Skill) {
        let stat = StatId::passive(skill);
        self.constant(&stat, "base", 10);
        self.plus(&stat, StatId::skill(skill), 1);
    }

    fn saving_throw(&mut self, ability: Ability) {
        let stat = StatId::saving_throw(ability);
        let key = ability.save_key();
        let modifiers = self.modifiers;

        self.plus(&stat, StatId::modifier(ability), 1);
        if save_proficiency(modifiers, &self.roster, ability) {
            self.plus(&stat, StatId::proficiency_bonus(), 1);
        }

        let keys = [key.as_str(), GLOBAL_SAVE_KEYS[0], GLOBAL_SAVE_KEYS[1], GLOBAL_SAVE_KEYS[2]];
        self.bonus_sources(&stat, modifiers.bonuses(GrantRule::Granted, &keys));
    }

    fn initiative(&mut self) {
        let stat = StatId::initiative();
        self.plus(&stat, StatId::modifier(Ability::Dexterity), 1);
        let modifiers = self.modifiers;
        for modifier in modifiers.bonuses(GrantRule::Granted, &["initiative"]) {
            self.resolver
                .register_source(stat.clone(), Box::new(ModifierSource::new(modifier)));
        }
    }

    fn armor_class(&mut self) {
        let stat = StatId::armor_class();
        let dex = StatId::modifier(Ability::Dexterity);
        let armor = ArmorState::from_inventory(&self.character.inventory);

        match &armor.body {
            None => {
                self.constant(&stat, "unarmored", 10);
                self.plus(&stat, dex, 1);
            }
            Some((name, body)) => {
                self.constant(&stat, name.clone(), body.base());
                match body {
                    BodyArmor::Light { .. } => self.plus(&stat, dex, 1),
                    BodyArmor::Medium { .. } => self.resolver.register_transform(
                        stat.clone(),
                        Box::new(BoundedTransform::new(dex, None, Some(MEDIUM_DEX_CAP))),
                    ),
                    BodyArmor::Heavy { .. } => {}
                }
            }
        }
        for (name, bonus) in &armor.shields {
            self.constant(&stat, name.clone(), *bonus);
        }
        if let Some(ability) = armor.unarmored_defense(&self.roster) {
            self.resolver.register_transform(
                stat.clone(),
                Box::new(BoundedTransform::new(StatId::modifier(ability), Some(0), None)),
            );
        }

        let modifiers = self.modifiers;
        for modifier in modifiers.bonuses(GrantRule::Granted, &["armor-class"]) {
            self.resolver
                .register_source(stat.clone(), Box::new(ModifierSource::new(modifier)));
        }
    }

    fn hit_points(&mut self) {
        let max = StatId::hit_points_max();
        let character = self.character;

        self.constant(&max, "base hit points", character.base_hit_points);
        self.constant(&max, "bonus hit points", character.bonus_hit_points);
        self.plus(
            &max,
            StatId::modifier(Ability::Constitution),
            self.roster.total_level(),
        );
        if let Some(value) = character.override_hit_points.filter(|v| *v > 0) {
            self.resolver
                .register_transform(max.clone(), Box::new(OverrideTransform::new(value)));
        }

        let current = StatId::hit_points_current();
        self.constant(
            &current,
            "removed hit points",
            character.removed_hit_points.saturating_neg(),
        );
        self.plus(&current, max, 1);

        self.constant(
            &StatId::hit_points_temp(),
            "temporary hit points",
            character.temporary_hit_points,
        );
    }
}

/// Expertise wins over proficiency; the two never stack.
pub(crate) fn skill_proficiency(modifiers: &ModifierSet, skill: Skill) -> ProficiencyLevel {
    let key = skill.sub_type();
    if modifiers.has_expertise(SKILL_GRANT_RULE, &key) {
        ProficiencyLevel::Expertise
    } else if modifiers.has_proficiency(SKILL_GRANT_RULE, &key) {
        ProficiencyLevel::Proficient
    } else {
        ProficiencyLevel::None
    }
}

/// Whether any granted save proficiency for `ability` survives the
/// provenance check.
pub(crate) fn save_proficiency(
    modifiers: &ModifierSet,
    roster: &ClassRoster<'_>,
    ability: Ability,
) -> bool {
    let key = ability.save_key();
    let keys = [key.as_str()];
    let proficient = modifiers
        .matching(GrantRule::Granted, &keys)
        .filter(|m| m.is_proficiency())
        .any(|m| roster.save_grant_counts(m));
    proficient
}

/// The `value` of the entry for `ability` in a stat array.
fn stat_value(entries: &[StatEntry], ability: Ability) -> Option<i32> {
    entries
        .iter()
        .find(|e| e.id == ability.id())
        .and_then(|e| e.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(character: &Character) -> crate::resolved::StatTable {
        let modifiers = ModifierSet::collect(character);
        Registrar::new(character, &modifiers, ClassRoster::new(character))
            .register_all()
            .resolve_all()
            .unwrap()
    }

    #[test]
    fn test_empty_character_resolves() {
        let table = resolve(&Character::default());
        assert_eq!(table.value(&StatId::score(Ability::Strength)), 10);
        assert_eq!(table.value(&StatId::total_level()), 0);
        assert_eq!(table.value(&StatId::armor_class()), 10);
        assert_eq!(table.value(&StatId::passive(Skill::Perception)), 10);
    }

    #[test]
    fn test_stat_value_lookup() {
        let entries = vec![
            StatEntry { id: 1, value: Some(15) },
            StatEntry { id: 2, value: None },
        ];
        assert_eq!(stat_value(&entries, Ability::Strength), Some(15));
        assert_eq!(stat_value(&entries, Ability::Dexterity), None);
        assert_eq!(stat_value(&entries, Ability::Charisma), None);
    }

    #[test]
    fn test_save_bonus_with_stat_id_adds_modifier() {
        let c = Character::from_value(json!({
            "stats": [{"id": 6, "value": 16}],
            "modifiers": {"class": [
                {"type": "bonus", "subType": "saving-throws", "value": 0, "statId": 6}
            ]}
        }))
        .unwrap();
        let table = resolve(&c);
        // CHA +3 from the aura on top of each save's own modifier
        assert_eq!(table.value(&StatId::saving_throw(Ability::Strength)), 3);
        assert_eq!(table.value(&StatId::saving_throw(Ability::Charisma)), 6);
    }

    #[test]
    fn test_breakdown_names_sources() {
        let c = Character::from_value(json!({
            "classes": [{"level": 2, "definition": {"name": "Cleric"}}],
        }))
        .unwrap();
        let table = resolve(&c);
        let level = table.get(&StatId::total_level()).unwrap();
        assert_eq!(level.value, 2);
        assert!(level.sources.iter().any(|(label, v)| label == "Cleric 2" && *v == 2));
    }
}
