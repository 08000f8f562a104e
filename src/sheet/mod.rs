//! The derived character sheet.
//!
//! [`CharacterSheet::derive`] runs one derivation pass: it types the
//! modifiers, registers every stat with a [`StatResolver`], resolves the
//! graph, and parses summon statblocks once. The list builders and the
//! text resolver then read from that pass without recomputing it.
//!
//! [`StatResolver`]: crate::resolver::StatResolver

mod register;
mod views;

pub use register::{
    DEFAULT_SCORE, GLOBAL_SAVE_KEYS, PASSIVE_SKILLS, SCORE_GRANT_RULE, SKILL_GRANT_RULE,
};
pub use views::{
    AbilityScore, CharacterHp, CharacterSummary, PassiveScores, SavingThrow, SkillScore,
};

use crate::ability::{signed, Ability, ProficiencyLevel, Skill};
use crate::actions::{build_actions, Action};
use crate::context::TextContext;
use crate::error::SheetError;
use crate::expression;
use crate::inventory::{classify, InventoryItem};
use crate::modifier::ModifierSet;
use crate::provenance::ClassRoster;
use crate::record::Character;
use crate::resolved::{ResolvedStat, StatTable};
use crate::scope::StatScope;
use crate::slots::{reconcile, SpellSlot};
use crate::spells::{build_spells, collect_summons, Spell, SummonCache};
use crate::stat_id::{StatId, StatValue};
use register::{save_proficiency, skill_proficiency, Registrar};
use tracing::debug;

/// Everything derived from one character record.
///
/// # Examples
///
/// ```rust
/// use charstat::{Ability, Character, CharacterSheet};
///
/// let character = Character::from_json(r#"{
///     "name": "Tamsin",
///     "stats": [{"id": 2, "value": 16}, {"id": 3, "value": 14}],
///     "classes": [{"level": 4, "definition": {"name": "Ranger"}}],
///     "baseHitPoints": 30
/// }"#).unwrap();
///
/// let sheet = CharacterSheet::derive(&character).unwrap();
/// assert_eq!(sheet.ability_modifier(Ability::Dexterity), 3);
/// assert_eq!(sheet.proficiency_bonus(), 2);
/// assert_eq!(sheet.armor_class(), 13);
/// assert_eq!(sheet.hit_points().max, 38);
/// ```
#[derive(Debug, Clone)]
pub struct CharacterSheet<'a> {
    character: &'a Character,
    roster: ClassRoster<'a>,
    modifiers: ModifierSet,
    stats: StatTable,
    summons: SummonCache,
}

impl<'a> CharacterSheet<'a> {
    /// Run a full derivation pass.
    pub fn derive(character: &'a Character) -> Result<Self, SheetError> {
        debug!(id = character.id, name = %character.name, "deriving character sheet");

        let modifiers = ModifierSet::collect(character);
        let roster = ClassRoster::new(character);
        let stats = Registrar::new(character, &modifiers, roster)
            .register_all()
            .resolve_all()?;
        let summons = collect_summons(character);

        debug!(
            stats = stats.len(),
            modifiers = modifiers.len(),
            summons = summons.len(),
            "character sheet derived"
        );
        Ok(Self {
            character,
            roster,
            modifiers,
            stats,
            summons,
        })
    }

    pub fn character(&self) -> &'a Character {
        self.character
    }

    pub fn roster(&self) -> &ClassRoster<'a> {
        &self.roster
    }

    pub fn modifiers(&self) -> &ModifierSet {
        &self.modifiers
    }

    /// Every resolved stat with its breakdown.
    pub fn stats(&self) -> &StatTable {
        &self.stats
    }

    /// Sources and transforms behind one number.
    pub fn breakdown(&self, stat: &StatId) -> Option<&ResolvedStat> {
        self.stats.get(stat)
    }

    fn value(&self, stat: &StatId) -> StatValue {
        self.stats.value(stat)
    }

    pub fn ability_score(&self, ability: Ability) -> i32 {
        self.value(&StatId::score(ability))
    }

    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.value(&StatId::modifier(ability))
    }

    /// All six abilities in STR..CHA order.
    pub fn ability_scores(&self) -> Vec<AbilityScore> {
        Ability::ALL
            .iter()
            .map(|&ability| AbilityScore {
                ability,
                score: self.ability_score(ability),
                modifier: self.ability_modifier(ability),
            })
            .collect()
    }

    pub fn total_level(&self) -> i32 {
        self.value(&StatId::total_level())
    }

    pub fn proficiency_bonus(&self) -> i32 {
        self.value(&StatId::proficiency_bonus())
    }

    pub fn skill_bonus(&self, skill: Skill) -> i32 {
        self.value(&StatId::skill(skill))
    }

    pub fn skills(&self) -> Vec<SkillScore> {
        Skill::ALL
            .iter()
            .map(|&skill| {
                let level = skill_proficiency(&self.modifiers, skill);
                let bonus_value = self.skill_bonus(skill);
                SkillScore {
                    skill,
                    name: skill.name().to_string(),
                    ability: skill.ability(),
                    bonus: signed(bonus_value),
                    bonus_value,
                    is_proficient: level != ProficiencyLevel::None,
                    has_expertise: level == ProficiencyLevel::Expertise,
                }
            })
            .collect()
    }

    pub fn saving_throw(&self, ability: Ability) -> i32 {
        self.value(&StatId::saving_throw(ability))
    }

    pub fn saving_throws(&self) -> Vec<SavingThrow> {
        Ability::ALL
            .iter()
            .map(|&ability| {
                let bonus_value = self.saving_throw(ability);
                SavingThrow {
                    ability,
                    name: ability.name().to_string(),
                    bonus: signed(bonus_value),
                    bonus_value,
                    is_proficient: save_proficiency(&self.modifiers, &self.roster, ability),
                }
            })
            .collect()
    }

    pub fn initiative(&self) -> i32 {
        self.value(&StatId::initiative())
    }

    pub fn armor_class(&self) -> i32 {
        self.value(&StatId::armor_class())
    }

    pub fn hit_points(&self) -> CharacterHp {
        CharacterHp {
            current: self.value(&StatId::hit_points_current()),
            max: self.value(&StatId::hit_points_max()),
            temp: self.value(&StatId::hit_points_temp()),
        }
    }

    pub fn passive_scores(&self) -> PassiveScores {
        PassiveScores {
            perception: self.value(&StatId::passive(Skill::Perception)),
            insight: self.value(&StatId::passive(Skill::Insight)),
            investigation: self.value(&StatId::passive(Skill::Investigation)),
        }
    }

    pub fn spell_slots(&self) -> Vec<SpellSlot> {
        reconcile(self.character)
    }

    pub fn actions(&self) -> Vec<Action> {
        build_actions(self.character, self)
    }

    pub fn spells(&self) -> Vec<Spell> {
        build_spells(self.character, self, &self.summons)
    }

    pub fn inventory(&self) -> Vec<InventoryItem> {
        classify(&self.character.inventory)
    }

    /// Resolve `{{…}}` tokens in a description against this sheet.
    pub fn resolve_text(&self, text: &str, context: &TextContext) -> String {
        expression::resolve_text(text, self, context)
    }

    pub fn summary(&self) -> CharacterSummary {
        let classes = self
            .character
            .classes
            .iter()
            .map(|class| {
                let name = if class.name().is_empty() {
                    "Class"
                } else {
                    class.name()
                };
                match class.subclass_definition.as_ref().filter(|s| !s.name.is_empty()) {
                    Some(sub) => format!("{name} ({}) {}", sub.name, class.level),
                    None => format!("{name} {}", class.level),
                }
            })
            .collect();

        CharacterSummary {
            id: self.character.id,
            name: self.character.name.clone(),
            avatar_url: self.character.avatar_url().map(str::to_string),
            classes,
        }
    }
}

impl StatScope for CharacterSheet<'_> {
    fn proficiency_bonus(&self) -> i32 {
        CharacterSheet::proficiency_bonus(self)
    }

    fn total_level(&self) -> i32 {
        CharacterSheet::total_level(self)
    }

    fn class_level(&self, class_name: &str) -> Option<i32> {
        self.roster.level_in(class_name)
    }

    fn ability_modifier(&self, ability: Ability) -> i32 {
        CharacterSheet::ability_modifier(self, ability)
    }
}
