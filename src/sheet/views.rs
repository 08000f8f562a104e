//! Plain view models handed to the presentation layer.

use crate::ability::{Ability, Skill};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScore {
    pub ability: Ability,
    pub score: i32,
    pub modifier: i32,
}

/// A skill row. `bonus` is the signed display form of `bonus_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillScore {
    pub skill: Skill,
    pub name: String,
    pub ability: Ability,
    pub bonus: String,
    pub bonus_value: i32,
    pub is_proficient: bool,
    pub has_expertise: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingThrow {
    pub ability: Ability,
    pub name: String,
    pub bonus: String,
    pub bonus_value: i32,
    pub is_proficient: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterHp {
    pub current: i32,
    pub max: i32,
    pub temp: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveScores {
    pub perception: i32,
    pub insight: i32,
    pub investigation: i32,
}

/// What gets cached for a pinned character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub id: i64,
    pub name: String,
    pub avatar_url: Option<String>,
    /// `"Name (Subclass) Level"` per class.
    pub classes: Vec<String>,
}

impl CharacterSummary {
    /// e.g. `"Fighter (Champion) 5 / Wizard 3"`.
    pub fn class_summary(&self) -> String {
        self.classes.join(" / ")
    }
}
