//! Stat sources module.
//!
//! Sources produce base values for stats. Multiple sources for the same
//! stat are summed together (additive). Sources are stateless and
//! deterministic - the same input always produces the same output.

use crate::modifier::Modifier;
use crate::stat_id::{StatId, StatValue};

/// Trait for stat sources that produce base values.
///
/// Multiple sources for the same stat are summed together (additive).
/// The label shows up in the stat's breakdown.
///
/// # Examples
///
/// ```rust
/// use charstat::{StatId, StatSource};
/// use charstat::source::ConstantSource;
///
/// let source = ConstantSource::new("base", 10);
/// assert_eq!(source.get_value(&StatId::armor_class()), 10);
/// assert_eq!(source.label(), "base");
/// ```
pub trait StatSource: Send + Sync {
    /// Get the value this source contributes to `stat_id`.
    fn get_value(&self, stat_id: &StatId) -> StatValue;

    /// Human-readable name for breakdowns.
    fn label(&self) -> String;
}

/// A source that always returns the same value.
#[derive(Debug, Clone)]
pub struct ConstantSource {
    label: String,
    value: StatValue,
}

impl ConstantSource {
    pub fn new(label: impl Into<String>, value: StatValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl StatSource for ConstantSource {
    fn get_value(&self, _stat_id: &StatId) -> StatValue {
        self.value
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

/// The flat part of a `bonus` modifier.
///
/// Non-bonus modifiers contribute nothing. A bonus that also scales with
/// an ability (`statId`) gets its scaling from a
/// [`ScalingTransform`](crate::transform::ScalingTransform) instead.
#[derive(Debug, Clone)]
pub struct ModifierSource {
    modifier: Modifier,
}

impl ModifierSource {
    pub fn new(modifier: &Modifier) -> Self {
        Self {
            modifier: modifier.clone(),
        }
    }
}

impl StatSource for ModifierSource {
    fn get_value(&self, _stat_id: &StatId) -> StatValue {
        self.modifier.bonus_value().unwrap_or(0)
    }

    fn label(&self) -> String {
        self.modifier.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SourceCategory;
    use crate::record::RawModifier;

    fn modifier(kind: &str, value: i32) -> Modifier {
        let raw = RawModifier {
            kind: kind.into(),
            sub_type: "armor-class".into(),
            value: Some(value),
            ..Default::default()
        };
        Modifier::from_raw(&raw, SourceCategory::Item)
    }

    #[test]
    fn test_constant_source() {
        let source = ConstantSource::new("base hit points", 20);
        assert_eq!(source.get_value(&StatId::hit_points_max()), 20);
    }

    #[test]
    fn test_modifier_source_uses_bonus_value() {
        let source = ModifierSource::new(&modifier("bonus", 2));
        assert_eq!(source.get_value(&StatId::armor_class()), 2);
        assert_eq!(source.label(), "item bonus (armor-class)");
    }

    #[test]
    fn test_modifier_source_ignores_non_bonus() {
        let source = ModifierSource::new(&modifier("set", 19));
        assert_eq!(source.get_value(&StatId::armor_class()), 0);
    }
}
