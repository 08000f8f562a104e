//! Class ownership and saving-throw grant provenance.
//!
//! A multiclassed character's record asserts saving-throw proficiency once
//! per class, but only the class taken at first level grants its save
//! proficiencies. The class lists carry no flag on the modifier itself, so
//! the rule is reconstructed from the feature the modifier points back to.

use crate::modifier::Modifier;
use crate::record::{Character, ClassEntry, FeatureDefinition};
use tracing::trace;

/// Whether a class feature is the first-level proficiency package every
/// class carries ("Proficiencies", "Starting Proficiencies", "Hunter's Traits").
pub fn is_generic_package(feature: &FeatureDefinition) -> bool {
    let name = feature.name.to_lowercase();
    feature.required_level == 1 && (name.contains("proficien") || name.contains("traits"))
}

/// The character's classes, with the starting class identified.
#[derive(Debug, Clone, Copy)]
pub struct ClassRoster<'a> {
    classes: &'a [ClassEntry],
    starting: Option<usize>,
}

impl<'a> ClassRoster<'a> {
    /// The starting class is the entry flagged `isStartingClass`, else the one
    /// matching `startingClassId`, else the first entry.
    pub fn new(character: &'a Character) -> Self {
        let classes = character.classes.as_slice();
        let starting = classes
            .iter()
            .position(|c| c.is_starting_class)
            .or_else(|| {
                let wanted = character.starting_class_id?;
                classes
                    .iter()
                    .position(|c| c.definition.id == wanted)
                    .or_else(|| classes.iter().position(|c| c.id == wanted))
            })
            .or(if classes.is_empty() { None } else { Some(0) });

        Self { classes, starting }
    }

    pub fn classes(&self) -> &'a [ClassEntry] {
        self.classes
    }

    pub fn starting_class(&self) -> Option<&'a ClassEntry> {
        self.starting.and_then(|idx| self.classes.get(idx))
    }

    pub fn total_level(&self) -> i32 {
        self.classes
            .iter()
            .fold(0, |sum, c| sum.saturating_add(c.level))
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.is_named(name))
    }

    /// Level in the named class, if the character has it.
    pub fn level_in(&self, name: &str) -> Option<i32> {
        self.classes
            .iter()
            .find(|c| c.is_named(name))
            .map(|c| c.level)
    }

    /// Every class that lists a feature with this id, with the feature.
    fn owners_of(&self, feature_id: i64) -> impl Iterator<Item = (usize, &'a FeatureDefinition)> {
        self.classes.iter().enumerate().flat_map(move |(idx, class)| {
            class
                .class_features
                .iter()
                .filter(move |f| f.definition.id == feature_id)
                .map(move |f| (idx, &f.definition))
        })
    }

    /// Decide where a saving-throw proficiency came from.
    pub fn classify_save_grant(&self, modifier: &Modifier) -> SaveGrant {
        let provenance = &modifier.provenance;
        if !provenance.is_class_feature() {
            return SaveGrant::NonClass;
        }
        let Some(component) = provenance.component_id else {
            return SaveGrant::UnknownFeature;
        };

        let mut located = false;
        let mut package_elsewhere = false;
        for (idx, feature) in self.owners_of(component) {
            located = true;
            if !is_generic_package(feature) {
                return SaveGrant::ClassFeature;
            }
            if Some(idx) == self.starting {
                return SaveGrant::StartingPackage;
            }
            package_elsewhere = true;
        }

        match (located, package_elsewhere) {
            (true, true) => SaveGrant::MulticlassPackage,
            _ => SaveGrant::UnknownFeature,
        }
    }

    /// Whether a saving-throw proficiency modifier should count.
    pub fn save_grant_counts(&self, modifier: &Modifier) -> bool {
        let grant = self.classify_save_grant(modifier);
        trace!(sub_type = %modifier.sub_type, ?grant, "saving throw provenance");
        grant.counts()
    }
}

/// Where a saving-throw proficiency was granted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveGrant {
    /// Race, feat, background, item or condition.
    NonClass,
    /// The starting class's first-level proficiency package.
    StartingPackage,
    /// A proficiency package from a class taken later. Ignored.
    MulticlassPackage,
    /// A specific class feature such as Slippery Mind.
    ClassFeature,
    /// A class grant whose feature could not be found.
    UnknownFeature,
}

impl SaveGrant {
    pub fn counts(self) -> bool {
        !matches!(self, SaveGrant::MulticlassPackage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{ModifierSet, SourceCategory};
    use serde_json::json;

    fn fighter_wizard() -> Character {
        Character::from_value(json!({
            "classes": [
                {"level": 3, "definition": {"id": 2, "name": "Wizard"}, "classFeatures": [
                    {"definition": {"id": 20, "name": "Proficiencies", "requiredLevel": 1}},
                ]},
                {"level": 5, "isStartingClass": true, "definition": {"id": 1, "name": "Fighter"}, "classFeatures": [
                    {"definition": {"id": 10, "name": "Proficiencies", "requiredLevel": 1}},
                    {"definition": {"id": 11, "name": "Indomitable", "requiredLevel": 9}},
                ]},
            ],
            "modifiers": {"class": [
                {"type": "proficiency", "subType": "strength-saving-throws", "componentId": 10, "componentTypeId": 12168134},
                {"type": "proficiency", "subType": "intelligence-saving-throws", "componentId": 20, "componentTypeId": 12168134},
                {"type": "proficiency", "subType": "wisdom-saving-throws", "componentId": 11, "componentTypeId": 12168134},
                {"type": "proficiency", "subType": "charisma-saving-throws", "componentId": 99, "componentTypeId": 12168134},
            ]}
        }))
        .unwrap()
    }

    #[test]
    fn test_generic_package_names() {
        let def = |name: &str, level| FeatureDefinition {
            id: 1,
            name: name.into(),
            required_level: level,
        };
        assert!(is_generic_package(&def("Proficiencies", 1)));
        assert!(is_generic_package(&def("Starting Proficiencies", 1)));
        assert!(is_generic_package(&def("Hunter's Traits", 1)));
        assert!(!is_generic_package(&def("Bonus Proficiencies", 3)));
        assert!(!is_generic_package(&def("Slippery Mind", 1)));
    }

    #[test]
    fn test_starting_class_by_flag() {
        let c = fighter_wizard();
        let roster = ClassRoster::new(&c);
        assert_eq!(roster.starting_class().map(|c| c.name()), Some("Fighter"));
        assert_eq!(roster.total_level(), 8);
        assert_eq!(roster.level_in("wizard"), Some(3));
    }

    #[test]
    fn test_starting_class_by_id_then_first() {
        let by_id = Character::from_value(json!({
            "startingClassId": 7,
            "classes": [{"definition": {"id": 3, "name": "Rogue"}}, {"definition": {"id": 7, "name": "Monk"}}]
        }))
        .unwrap();
        assert_eq!(ClassRoster::new(&by_id).starting_class().map(|c| c.name()), Some("Monk"));

        let fallback = Character::from_value(json!({
            "classes": [{"definition": {"name": "Bard"}}, {"definition": {"name": "Warlock"}}]
        }))
        .unwrap();
        assert_eq!(ClassRoster::new(&fallback).starting_class().map(|c| c.name()), Some("Bard"));

        let empty = Character::default();
        assert!(ClassRoster::new(&empty).starting_class().is_none());
    }

    #[test]
    fn test_classify_save_grants() {
        let c = fighter_wizard();
        let roster = ClassRoster::new(&c);
        let grants: Vec<_> = ModifierSet::collect(&c)
            .iter()
            .map(|m| roster.classify_save_grant(m))
            .collect();
        assert_eq!(
            grants,
            vec![
                SaveGrant::StartingPackage,
                SaveGrant::MulticlassPackage,
                SaveGrant::ClassFeature,
                SaveGrant::UnknownFeature,
            ]
        );
        assert!(!SaveGrant::MulticlassPackage.counts());
        assert!(SaveGrant::UnknownFeature.counts());
    }

    #[test]
    fn test_non_class_grant() {
        let c = Character::default();
        let roster = ClassRoster::new(&c);
        let raw = crate::record::RawModifier {
            kind: "proficiency".into(),
            sub_type: "wisdom-saving-throws".into(),
            ..Default::default()
        };
        let m = Modifier::from_raw(&raw, SourceCategory::Feat);
        assert_eq!(roster.classify_save_grant(&m), SaveGrant::NonClass);
    }
}
