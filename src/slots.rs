//! Spell slot reconciliation.
//!
//! Slot data arrives from up to three places that rarely agree: explicit
//! `spellSlots` rows, `pactMagic` rows, and a `levelSpellSlots` rules
//! table on a class or on the character. Each row may report any subset of
//! `used`, `max` and `available`. [`reconcile`] folds them into one
//! [`SpellSlot`] per spell level.

use crate::record::{Character, SlotEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Reconciled slots for one spell level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub level: i32,
    pub used: i32,
    pub max: i32,
    pub available: i32,
    /// `Some("Pact")` when only pact magic reported this level.
    pub name: Option<String>,
}

/// Which slot list a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    Standard,
    Pact,
}

/// Running totals for one spell level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotAccumulator {
    pub used: i32,
    pub max_sum: i32,
    pub available_sum: i32,
    pub standard: bool,
    pub pact: bool,
}

impl SlotAccumulator {
    fn add(&mut self, entry: &SlotEntry, source: SlotSource) {
        self.used = self.used.saturating_add(entry.used);
        self.max_sum = self.max_sum.saturating_add(entry.max.unwrap_or(0));
        self.available_sum = self
            .available_sum
            .saturating_add(entry.available.unwrap_or(0));
        match source {
            SlotSource::Standard => self.standard = true,
            SlotSource::Pact => self.pact = true,
        }
    }

    fn pact_only(&self) -> bool {
        self.pact && !self.standard
    }
}

/// Ways of deciding a level's maximum, tried in [`SlotMaxStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMaxStrategy {
    /// The rows reported a positive `max`.
    ExplicitMax,
    /// The rules table has a positive entry for this level.
    RuleTable,
    /// Rows only reported what is left: `available + used`.
    AvailablePlusUsed,
    /// Nothing else is known; assume every slot is spent.
    UsedOnly,
}

impl SlotMaxStrategy {
    pub const ORDER: [SlotMaxStrategy; 4] = [
        SlotMaxStrategy::ExplicitMax,
        SlotMaxStrategy::RuleTable,
        SlotMaxStrategy::AvailablePlusUsed,
        SlotMaxStrategy::UsedOnly,
    ];

    /// The maximum this strategy yields, or `None` if it does not apply.
    pub fn try_resolve(self, acc: &SlotAccumulator, table_value: Option<i32>) -> Option<i32> {
        match self {
            SlotMaxStrategy::ExplicitMax => (acc.max_sum > 0).then_some(acc.max_sum),
            SlotMaxStrategy::RuleTable => table_value.filter(|v| *v > 0),
            SlotMaxStrategy::AvailablePlusUsed => {
                (acc.available_sum > 0).then_some(acc.available_sum.saturating_add(acc.used))
            }
            SlotMaxStrategy::UsedOnly => Some(acc.used),
        }
    }

    /// Run the strategies in order and return the first answer.
    pub fn resolve(level: i32, acc: &SlotAccumulator, table_value: Option<i32>) -> i32 {
        for strategy in Self::ORDER {
            if let Some(max) = strategy.try_resolve(acc, table_value) {
                trace!(level, ?strategy, max, "slot maximum");
                return max;
            }
        }
        acc.used
    }
}

/// Where the slot table row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin<'a> {
    /// A class's own table, indexed by that class's level.
    Class(&'a str),
    /// The character-wide table, indexed by total level.
    Character,
}

/// Find the slot table row that applies to this character.
///
/// The first class carrying a non-empty table wins; otherwise the
/// character-level table is used. The level index is clamped into the table.
pub fn rule_row(character: &Character) -> Option<(&[i32], TableOrigin<'_>)> {
    let class_row = character.classes.iter().find_map(|class| {
        let table = &class.definition.spell_rules.as_ref()?.level_spell_slots;
        let row = clamped(table, class.level)?;
        Some((row, TableOrigin::Class(class.name())))
    });
    class_row.or_else(|| {
        let table = &character.spell_rules.as_ref()?.level_spell_slots;
        let row = clamped(table, character.total_level())?;
        Some((row, TableOrigin::Character))
    })
}

fn clamped(table: &[Vec<i32>], level: i32) -> Option<&[i32]> {
    let last = table.len().checked_sub(1)?;
    let idx = usize::try_from(level.max(0)).unwrap_or(0).min(last);
    table.get(idx).map(Vec::as_slice)
}

/// Merge every slot source into one entry per spell level, sorted by level.
///
/// # Examples
///
/// ```rust
/// use charstat::Character;
/// use charstat::slots::reconcile;
///
/// let c = Character::from_json(r#"{
///     "pactMagic": [{"level": 2, "used": 0, "available": 2}]
/// }"#).unwrap();
///
/// let slots = reconcile(&c);
/// assert_eq!(slots.len(), 1);
/// assert_eq!((slots[0].level, slots[0].max, slots[0].available), (2, 2, 2));
/// assert_eq!(slots[0].name.as_deref(), Some("Pact"));
/// ```
pub fn reconcile(character: &Character) -> Vec<SpellSlot> {
    let mut levels: BTreeMap<i32, SlotAccumulator> = BTreeMap::new();

    let rows = character
        .spell_slots
        .iter()
        .map(|e| (e, SlotSource::Standard))
        .chain(character.pact_magic.iter().map(|e| (e, SlotSource::Pact)));
    for (entry, source) in rows {
        match entry.level {
            Some(level) if level >= 1 => levels.entry(level).or_default().add(entry, source),
            _ => trace!(?entry, "slot row without a spell level"),
        }
    }

    let row = rule_row(character);
    if let Some((row, origin)) = row {
        debug!(?origin, row = ?row, "spell slot table");
        for level in 1..=row.len() as i32 {
            levels.entry(level).or_default();
        }
    }

    levels
        .into_iter()
        .map(|(level, acc)| {
            let table_value = row.and_then(|(row, _)| row.get((level - 1) as usize).copied());
            let max = SlotMaxStrategy::resolve(level, &acc, table_value);
            let available = if acc.available_sum > 0 {
                acc.available_sum
            } else {
                max.saturating_sub(acc.used).max(0)
            };
            SpellSlot {
                level,
                used: acc.used,
                max,
                available,
                name: acc.pact_only().then(|| "Pact".to_string()),
            }
        })
        .collect()
}
