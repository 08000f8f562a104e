//! Read access to resolved character numbers.
//!
//! The text resolver and the action and spell builders only need a handful
//! of derived facts. [`StatScope`] is that seam; `CharacterSheet` implements
//! it, and tests can implement it with plain numbers.

use crate::ability::Ability;

/// Character facts the builders and the text resolver consume.
pub trait StatScope {
    fn proficiency_bonus(&self) -> i32;

    fn total_level(&self) -> i32;

    /// Level in the named class (case-insensitive), if the character has it.
    fn class_level(&self, class_name: &str) -> Option<i32>;

    fn ability_modifier(&self, ability: Ability) -> i32;

    /// Whether the character has at least one level in the named class.
    fn has_class(&self, class_name: &str) -> bool {
        self.class_level(class_name).is_some_and(|level| level > 0)
    }
}
