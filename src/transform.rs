//! Stat transforms module.
//!
//! Transforms modify stat values after sources are collected.
//! Transforms can read other stats (dependencies) and must declare
//! them explicitly via `depends_on()`.

use crate::ability::{ability_modifier, proficiency_bonus};
use crate::error::SheetError;
use crate::stat_id::{StatId, StatValue};
use std::collections::HashMap;

/// Phase for transform application order.
///
/// Transforms are grouped by phase and applied in phase order.
/// Within each phase, transforms are applied in registration order.
///
/// # Examples
///
/// ```rust
/// use charstat::transform::TransformPhase;
///
/// assert!(TransformPhase::Additive < TransformPhase::Floor);
/// assert!(TransformPhase::Floor < TransformPhase::Override);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransformPhase {
    /// Contributions that add to the running total.
    Additive,

    /// Lower bounds, such as a "set" modifier that only wins when higher.
    Floor,

    /// Absolute replacements. Applied last, so nothing can undo them.
    Override,
}

/// Trait for stat transforms that modify stat values.
///
/// Transforms can read other stats (dependencies) and must declare
/// them explicitly. The resolver ensures dependencies are resolved
/// before applying the transform.
///
/// # Examples
///
/// ```rust
/// use charstat::transform::{StatTransform, ScalingTransform};
/// use charstat::{Ability, StatId};
/// use std::collections::HashMap;
///
/// let dex = StatId::modifier(Ability::Dexterity);
/// let transform = ScalingTransform::new(dex.clone(), 1);
///
/// let mut deps = HashMap::new();
/// deps.insert(dex, 3);
///
/// // 10 (base) + 3 (DEX) = 13
/// assert_eq!(transform.apply(10, &deps).unwrap(), 13);
/// ```
pub trait StatTransform: Send + Sync {
    /// Stat IDs that must be resolved before this transform runs.
    fn depends_on(&self) -> Vec<StatId>;

    /// Default implementation returns the `Additive` phase.
    fn phase(&self) -> TransformPhase {
        TransformPhase::Additive
    }

    /// Apply the transform to the running value.
    ///
    /// # Arguments
    ///
    /// * `input` - The current stat value (after sources and previous transforms)
    /// * `dependencies` - Map of resolved dependency stats (keyed by StatId)
    fn apply(
        &self,
        input: StatValue,
        dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError>;

    /// Human-readable description, used in `ResolvedStat` breakdowns.
    fn description(&self) -> String;
}

fn lookup(dependencies: &HashMap<StatId, StatValue>, id: &StatId) -> Result<StatValue, SheetError> {
    dependencies
        .get(id)
        .copied()
        .ok_or_else(|| SheetError::MissingDependency(id.clone()))
}

/// Adds `dependency × factor` to the input.
///
/// Used for every "plus another stat" rule: an ability modifier on a skill,
/// double proficiency for expertise, CON modifier per character level.
#[derive(Debug, Clone)]
pub struct ScalingTransform {
    dependency: StatId,
    factor: i32,
}

impl ScalingTransform {
    pub fn new(dependency: StatId, factor: i32) -> Self {
        Self { dependency, factor }
    }
}

impl StatTransform for ScalingTransform {
    fn depends_on(&self) -> Vec<StatId> {
        vec![self.dependency.clone()]
    }

    fn apply(
        &self,
        input: StatValue,
        dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        let scaled = lookup(dependencies, &self.dependency)?.saturating_mul(self.factor);
        Ok(input.saturating_add(scaled))
    }

    fn description(&self) -> String {
        match self.factor {
            1 => format!("+ {}", self.dependency),
            factor => format!("+ {} × {}", factor, self.dependency),
        }
    }
}

/// Adds a dependency after clamping it into `[min, max]`.
///
/// Medium armor caps the DEX contribution at +2; unarmored defense never
/// lets a negative modifier reduce AC.
///
/// ```rust
/// use charstat::transform::{BoundedTransform, StatTransform};
/// use charstat::{Ability, StatId};
/// use std::collections::HashMap;
///
/// let dex = StatId::modifier(Ability::Dexterity);
/// let medium = BoundedTransform::new(dex.clone(), None, Some(2));
///
/// let deps = HashMap::from([(dex, 4)]);
/// assert_eq!(medium.apply(14, &deps).unwrap(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedTransform {
    dependency: StatId,
    min: Option<StatValue>,
    max: Option<StatValue>,
}

impl BoundedTransform {
    pub fn new(dependency: StatId, min: Option<StatValue>, max: Option<StatValue>) -> Self {
        Self {
            dependency,
            min,
            max,
        }
    }
}

impl StatTransform for BoundedTransform {
    fn depends_on(&self) -> Vec<StatId> {
        vec![self.dependency.clone()]
    }

    fn apply(
        &self,
        input: StatValue,
        dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        let mut value = lookup(dependencies, &self.dependency)?;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        Ok(input.saturating_add(value))
    }

    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("+ {} in [{min}, {max}]", self.dependency),
            (Some(min), None) => format!("+ {} (min {min})", self.dependency),
            (None, Some(max)) => format!("+ {} (max {max})", self.dependency),
            (None, None) => format!("+ {}", self.dependency),
        }
    }
}

/// Adds the ability modifier of a score stat: `floor((score - 10) / 2)`.
#[derive(Debug, Clone)]
pub struct AbilityModifierTransform {
    score: StatId,
}

impl AbilityModifierTransform {
    pub fn new(score: StatId) -> Self {
        Self { score }
    }
}

impl StatTransform for AbilityModifierTransform {
    fn depends_on(&self) -> Vec<StatId> {
        vec![self.score.clone()]
    }

    fn apply(
        &self,
        input: StatValue,
        dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        Ok(input.saturating_add(ability_modifier(lookup(dependencies, &self.score)?)))
    }

    fn description(&self) -> String {
        format!("modifier of {}", self.score)
    }
}

/// Adds the proficiency bonus for a total character level.
#[derive(Debug, Clone)]
pub struct ProficiencyBonusTransform {
    level: StatId,
}

impl ProficiencyBonusTransform {
    pub fn new(level: StatId) -> Self {
        Self { level }
    }
}

impl StatTransform for ProficiencyBonusTransform {
    fn depends_on(&self) -> Vec<StatId> {
        vec![self.level.clone()]
    }

    fn apply(
        &self,
        input: StatValue,
        dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        Ok(input.saturating_add(proficiency_bonus(lookup(dependencies, &self.level)?)))
    }

    fn description(&self) -> String {
        format!("proficiency for {}", self.level)
    }
}

/// A floor: a "set" modifier replaces the value only when the value is
/// lower.
///
/// # Examples
///
/// ```rust
/// use charstat::transform::{StatTransform, ClampTransform};
/// use std::collections::HashMap;
///
/// let deps = HashMap::new();
/// let belt = ClampTransform::with_min(21);
/// assert_eq!(belt.apply(16, &deps).unwrap(), 21);
/// assert_eq!(belt.apply(22, &deps).unwrap(), 22);
/// ```
#[derive(Debug, Clone)]
pub struct ClampTransform {
    /// Minimum allowed value (inclusive).
    pub min: StatValue,
}

impl ClampTransform {
    pub fn with_min(min: StatValue) -> Self {
        Self { min }
    }
}

impl StatTransform for ClampTransform {
    fn depends_on(&self) -> Vec<StatId> {
        Vec::new()
    }

    fn phase(&self) -> TransformPhase {
        TransformPhase::Floor
    }

    fn apply(
        &self,
        input: StatValue,
        _dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        Ok(input.max(self.min))
    }

    fn description(&self) -> String {
        format!("at least {}", self.min)
    }
}

/// Replaces the value outright, discarding everything before it.
///
/// ```rust
/// use charstat::transform::{OverrideTransform, StatTransform};
/// use std::collections::HashMap;
///
/// let fixed = OverrideTransform::new(15);
/// assert_eq!(fixed.apply(8, &HashMap::new()).unwrap(), 15);
/// ```
#[derive(Debug, Clone)]
pub struct OverrideTransform {
    value: StatValue,
}

impl OverrideTransform {
    pub fn new(value: StatValue) -> Self {
        Self { value }
    }
}

impl StatTransform for OverrideTransform {
    fn depends_on(&self) -> Vec<StatId> {
        Vec::new()
    }

    fn phase(&self) -> TransformPhase {
        TransformPhase::Override
    }

    fn apply(
        &self,
        _input: StatValue,
        _dependencies: &HashMap<StatId, StatValue>,
    ) -> Result<StatValue, SheetError> {
        Ok(self.value)
    }

    fn description(&self) -> String {
        format!("override = {}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::Ability;

    #[test]
    fn test_scaling_transform() {
        let prof = StatId::proficiency_bonus();
        let expertise = ScalingTransform::new(prof.clone(), 2);
        let deps = HashMap::from([(prof, 3)]);
        assert_eq!(expertise.apply(1, &deps).unwrap(), 7);
        assert_eq!(expertise.description(), "+ 2 × proficiency-bonus");
    }

    #[test]
    fn test_scaling_transform_saturates() {
        let con = StatId::modifier(Ability::Constitution);
        let per_level = ScalingTransform::new(con.clone(), 20);
        let deps = HashMap::from([(con, 1_073_741_818)]);
        assert_eq!(per_level.apply(2_000_000_000, &deps).unwrap(), i32::MAX);
        assert_eq!(per_level.apply(i32::MIN, &deps).unwrap(), -1);
    }

    #[test]
    fn test_scaling_transform_missing_dependency() {
        let transform = ScalingTransform::new(StatId::initiative(), 1);
        let err = transform.apply(0, &HashMap::new()).unwrap_err();
        assert!(matches!(err, SheetError::MissingDependency(id) if id == StatId::initiative()));
    }

    #[test]
    fn test_bounded_transform_floor() {
        let wis = StatId::modifier(Ability::Wisdom);
        let unarmored = BoundedTransform::new(wis.clone(), Some(0), None);
        assert_eq!(unarmored.apply(12, &HashMap::from([(wis.clone(), -1)])).unwrap(), 12);
        assert_eq!(unarmored.apply(12, &HashMap::from([(wis, 3)])).unwrap(), 15);
    }

    #[test]
    fn test_ability_modifier_transform() {
        let score = StatId::score(Ability::Strength);
        let transform = AbilityModifierTransform::new(score.clone());
        assert_eq!(transform.apply(0, &HashMap::from([(score.clone(), 15)])).unwrap(), 2);
        assert_eq!(transform.apply(0, &HashMap::from([(score, 7)])).unwrap(), -2);
    }

    #[test]
    fn test_proficiency_bonus_transform() {
        let level = StatId::total_level();
        let transform = ProficiencyBonusTransform::new(level.clone());
        assert_eq!(transform.apply(0, &HashMap::from([(level.clone(), 1)])).unwrap(), 2);
        assert_eq!(transform.apply(0, &HashMap::from([(level, 17)])).unwrap(), 6);
    }

    #[test]
    fn test_clamp_transform_min_only() {
        let transform = ClampTransform::with_min(19);
        let deps = HashMap::new();
        assert_eq!(transform.apply(12, &deps).unwrap(), 19);
        assert_eq!(transform.apply(20, &deps).unwrap(), 20);
        assert_eq!(transform.phase(), TransformPhase::Floor);
        assert_eq!(transform.description(), "at least 19");
    }

    #[test]
    fn test_override_transform() {
        let transform = OverrideTransform::new(8);
        assert_eq!(transform.apply(30, &HashMap::new()).unwrap(), 8);
        assert_eq!(transform.phase(), TransformPhase::Override);
    }
}
