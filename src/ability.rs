//! Abilities, skills and the arithmetic shared by every calculator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six ability scores, numbered 1–6 the way character records number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Record id of this ability (`1` = STR … `6` = CHA).
    pub fn id(self) -> i64 {
        match self {
            Ability::Strength => 1,
            Ability::Dexterity => 2,
            Ability::Constitution => 3,
            Ability::Intelligence => 4,
            Ability::Wisdom => 5,
            Ability::Charisma => 6,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Parse `"str"`, `"STR"` or `"strength"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|a| {
            a.abbreviation().eq_ignore_ascii_case(s) || a.key().eq_ignore_ascii_case(s)
        })
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    /// Lower-case full name, the stem of every modifier `subType` for this ability.
    pub fn key(self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    pub fn score_key(self) -> String {
        format!("{}-score", self.key())
    }

    pub fn save_key(self) -> String {
        format!("{}-saving-throws", self.key())
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// The eighteen skills, in sheet (alphabetical) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Acrobatics,
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    pub const ALL: [Skill; 18] = [
        Skill::Acrobatics,
        Skill::AnimalHandling,
        Skill::Arcana,
        Skill::Athletics,
        Skill::Deception,
        Skill::History,
        Skill::Insight,
        Skill::Intimidation,
        Skill::Investigation,
        Skill::Medicine,
        Skill::Nature,
        Skill::Perception,
        Skill::Performance,
        Skill::Persuasion,
        Skill::Religion,
        Skill::SleightOfHand,
        Skill::Stealth,
        Skill::Survival,
    ];

    pub fn ability(self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Skill::Acrobatics => "Acrobatics",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Arcana => "Arcana",
            Skill::Athletics => "Athletics",
            Skill::Deception => "Deception",
            Skill::History => "History",
            Skill::Insight => "Insight",
            Skill::Intimidation => "Intimidation",
            Skill::Investigation => "Investigation",
            Skill::Medicine => "Medicine",
            Skill::Nature => "Nature",
            Skill::Perception => "Perception",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
            Skill::Religion => "Religion",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Survival => "Survival",
        }
    }

    /// Kebab-case modifier key, e.g. `"sleight-of-hand"`.
    pub fn sub_type(self) -> String {
        self.name().to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How trained a character is in a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProficiencyLevel {
    #[default]
    None,
    Proficient,
    Expertise,
}

impl ProficiencyLevel {
    /// How many times the proficiency bonus is added.
    pub fn multiplier(self) -> i32 {
        match self {
            ProficiencyLevel::None => 0,
            ProficiencyLevel::Proficient => 1,
            ProficiencyLevel::Expertise => 2,
        }
    }
}

/// `floor((score - 10) / 2)`, rounding toward negative infinity.
///
/// ```rust
/// use charstat::ability::ability_modifier;
///
/// assert_eq!(ability_modifier(10), 0);
/// assert_eq!(ability_modifier(17), 3);
/// assert_eq!(ability_modifier(9), -1);
/// ```
pub fn ability_modifier(score: i32) -> i32 {
    score.saturating_sub(10).div_euclid(2)
}

/// `ceil(level / 4) + 1`: +2 at levels 1–4, +3 at 5–8, up to +6 at 17–20.
pub fn proficiency_bonus(total_level: i32) -> i32 {
    total_level.saturating_sub(1).div_euclid(4) + 2
}

/// Render a bonus with an explicit `+` for non-negative values.
pub fn signed(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_ids_round_trip() {
        for ability in Ability::ALL {
            assert_eq!(Ability::from_id(ability.id()), Some(ability));
        }
        assert_eq!(Ability::from_id(0), None);
        assert_eq!(Ability::from_id(7), None);
    }

    #[test]
    fn test_ability_parse() {
        assert_eq!(Ability::parse("wis"), Some(Ability::Wisdom));
        assert_eq!(Ability::parse("CHA"), Some(Ability::Charisma));
        assert_eq!(Ability::parse("strength"), Some(Ability::Strength));
        assert_eq!(Ability::parse("luck"), None);
    }

    #[test]
    fn test_skill_sub_types() {
        assert_eq!(Skill::SleightOfHand.sub_type(), "sleight-of-hand");
        assert_eq!(Skill::Perception.sub_type(), "perception");
        assert_eq!(Skill::ALL.len(), 18);
    }

    #[test]
    fn test_ability_modifier_floors() {
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn test_proficiency_table() {
        for (levels, bonus) in [(1..=4, 2), (5..=8, 3), (9..=12, 4), (13..=16, 5), (17..=20, 6)] {
            for level in levels {
                assert_eq!(proficiency_bonus(level), bonus, "level {level}");
            }
        }
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(4), "+4");
        assert_eq!(signed(-2), "-2");
    }
}
