//! Equipped armor state.
//!
//! Armor class depends on what is worn, not on how many armor records are
//! equipped: one body armor (the last one wins), any number of shields, or
//! nothing at all. `ArmorState` folds the inventory into that shape before
//! the AC stat is registered.

use crate::ability::Ability;
use crate::provenance::ClassRoster;
use crate::record::Item;
use tracing::trace;

pub const LIGHT_ARMOR: i64 = 1;
pub const MEDIUM_ARMOR: i64 = 2;
pub const HEAVY_ARMOR: i64 = 3;
pub const SHIELD: i64 = 4;

/// Medium armor never adds more DEX than this.
pub const MEDIUM_DEX_CAP: i32 = 2;

/// Weight class of a worn suit of armor, with its base AC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyArmor {
    Light { base: i32 },
    Medium { base: i32 },
    Heavy { base: i32 },
}

impl BodyArmor {
    /// Classify an armor type id. Anything that is not light, medium or a
    /// shield is treated as heavy.
    fn from_type(type_id: Option<i64>, base: i32) -> Self {
        match type_id {
            Some(LIGHT_ARMOR) => BodyArmor::Light { base },
            Some(MEDIUM_ARMOR) => BodyArmor::Medium { base },
            _ => BodyArmor::Heavy { base },
        }
    }

    pub fn base(self) -> i32 {
        match self {
            BodyArmor::Light { base } | BodyArmor::Medium { base } | BodyArmor::Heavy { base } => base,
        }
    }
}

/// What the character is wearing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmorState {
    pub body: Option<(String, BodyArmor)>,
    /// Each equipped shield's name and AC bonus.
    pub shields: Vec<(String, i32)>,
}

impl ArmorState {
    /// Fold equipped armor items, in inventory order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use charstat::armor::{ArmorState, BodyArmor};
    /// use charstat::Character;
    ///
    /// let c = Character::from_json(r#"{"inventory": [
    ///     {"equipped": true, "definition": {"name": "Chain Shirt", "filterType": "Armor", "armorTypeId": 2, "armorClass": 13}},
    ///     {"equipped": true, "definition": {"name": "Shield", "filterType": "Armor", "armorTypeId": 4, "armorClass": 2}},
    ///     {"equipped": false, "definition": {"name": "Plate", "filterType": "Armor", "armorTypeId": 3, "armorClass": 18}}
    /// ]}"#).unwrap();
    ///
    /// let state = ArmorState::from_inventory(&c.inventory);
    /// assert_eq!(state.body.clone().map(|(_, b)| b), Some(BodyArmor::Medium { base: 13 }));
    /// assert_eq!(state.shield_bonus(), 2);
    /// ```
    pub fn from_inventory(items: &[Item]) -> Self {
        let mut state = ArmorState::default();
        for item in items.iter().filter(|i| i.equipped) {
            let def = &item.definition;
            if !def.filter_type.eq_ignore_ascii_case("armor") {
                continue;
            }
            let armor_class = def.armor_class.unwrap_or(0);
            if def.armor_type_id == Some(SHIELD) {
                state.shields.push((def.name.clone(), armor_class));
            } else {
                if let Some((previous, _)) = &state.body {
                    trace!(replaced = %previous, by = %def.name, "multiple body armors equipped");
                }
                state.body = Some((
                    def.name.clone(),
                    BodyArmor::from_type(def.armor_type_id, armor_class),
                ));
            }
        }
        state
    }

    pub fn has_body_armor(&self) -> bool {
        self.body.is_some()
    }

    pub fn has_shield(&self) -> bool {
        !self.shields.is_empty()
    }

    pub fn shield_bonus(&self) -> i32 {
        self.shields
            .iter()
            .fold(0, |sum, (_, bonus)| sum.saturating_add(*bonus))
    }

    /// The ability an unarmored class feature adds to AC, if any.
    ///
    /// Only without body armor: a Monk without a shield adds WIS, otherwise
    /// a Barbarian adds CON.
    pub fn unarmored_defense(&self, roster: &ClassRoster<'_>) -> Option<Ability> {
        if self.has_body_armor() {
            return None;
        }
        if roster.has_class("Monk") && !self.has_shield() {
            Some(Ability::Wisdom)
        } else if roster.has_class("Barbarian") {
            Some(Ability::Constitution)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Character;
    use serde_json::json;

    fn armor(name: &str, type_id: i64, ac: i32) -> serde_json::Value {
        json!({"equipped": true, "definition": {
            "name": name, "filterType": "Armor", "armorTypeId": type_id, "armorClass": ac
        }})
    }

    fn character(inventory: Vec<serde_json::Value>, class: &str) -> Character {
        Character::from_value(json!({
            "inventory": inventory,
            "classes": [{"level": 1, "definition": {"name": class}}]
        }))
        .unwrap()
    }

    #[test]
    fn test_unequipped_and_non_armor_ignored() {
        let c = Character::from_value(json!({"inventory": [
            {"equipped": false, "definition": {"name": "Plate", "filterType": "Armor", "armorTypeId": 3, "armorClass": 18}},
            {"equipped": true, "definition": {"name": "Cloak", "filterType": "Wondrous item", "armorClass": 1}},
        ]}))
        .unwrap();
        assert_eq!(ArmorState::from_inventory(&c.inventory), ArmorState::default());
    }

    #[test]
    fn test_last_body_armor_wins() {
        let c = character(vec![armor("Leather", 1, 11), armor("Splint", 3, 17)], "Fighter");
        let state = ArmorState::from_inventory(&c.inventory);
        assert_eq!(
            state.body,
            Some(("Splint".to_string(), BodyArmor::Heavy { base: 17 }))
        );
    }

    #[test]
    fn test_unknown_type_is_heavy() {
        assert_eq!(BodyArmor::from_type(None, 15), BodyArmor::Heavy { base: 15 });
        assert_eq!(BodyArmor::from_type(Some(HEAVY_ARMOR), 18).base(), 18);
    }

    #[test]
    fn test_unarmored_defense() {
        let monk = character(vec![], "Monk");
        let roster = ClassRoster::new(&monk);
        assert_eq!(
            ArmorState::default().unarmored_defense(&roster),
            Some(Ability::Wisdom)
        );

        let shielded = character(vec![armor("Shield", 4, 2)], "Monk");
        let state = ArmorState::from_inventory(&shielded.inventory);
        assert_eq!(state.unarmored_defense(&ClassRoster::new(&shielded)), None);

        let barbarian = character(vec![armor("Shield", 4, 2)], "Barbarian");
        let state = ArmorState::from_inventory(&barbarian.inventory);
        assert_eq!(
            state.unarmored_defense(&ClassRoster::new(&barbarian)),
            Some(Ability::Constitution)
        );

        let armored = character(vec![armor("Hide", 2, 12)], "Barbarian");
        let state = ArmorState::from_inventory(&armored.inventory);
        assert_eq!(state.unarmored_defense(&ClassRoster::new(&armored)), None);
    }
}
