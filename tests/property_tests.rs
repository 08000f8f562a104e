use charstat::ability::{ability_modifier, proficiency_bonus};
use charstat::*;
use proptest::prelude::*;
use serde_json::json;

fn record(scores: &[i32], levels: &[i32]) -> Character {
    let stats: Vec<_> = scores
        .iter()
        .enumerate()
        .map(|(i, v)| json!({"id": i + 1, "value": v}))
        .collect();
    let names = ["Fighter", "Rogue", "Monk"];
    let classes: Vec<_> = levels
        .iter()
        .zip(names)
        .map(|(level, name)| json!({"level": level, "definition": {"name": name}}))
        .collect();
    Character::from_value(json!({
        "stats": stats,
        "classes": classes,
        "baseHitPoints": 12,
        "modifiers": {"race": [{"type": "bonus", "subType": "dexterity-score", "value": 1}]}
    }))
    .unwrap()
}

proptest! {
    #[test]
    fn proficiency_is_monotonic(level in 1i32..20) {
        let here = proficiency_bonus(level);
        let next = proficiency_bonus(level + 1);
        prop_assert!(next >= here);
        prop_assert!(next - here <= 1);
        prop_assert!((2..=6).contains(&here));
    }

    #[test]
    fn proficiency_matches_table(level in 1i32..=20) {
        let expected = match level {
            1..=4 => 2,
            5..=8 => 3,
            9..=12 => 4,
            13..=16 => 5,
            _ => 6,
        };
        prop_assert_eq!(proficiency_bonus(level), expected);
    }

    #[test]
    fn modifier_floors(score in -30i32..60) {
        let expected = ((score - 10) as f64 / 2.0).floor() as i32;
        prop_assert_eq!(ability_modifier(score), expected);
    }

    #[test]
    fn derivation_is_idempotent(
        scores in prop::collection::vec(1i32..=30, 6),
        levels in prop::collection::vec(1i32..=10, 1..=3),
    ) {
        let character = record(&scores, &levels);
        let first = CharacterSheet::derive(&character).unwrap();
        let second = CharacterSheet::derive(&character).unwrap();
        prop_assert_eq!(first.stats(), second.stats());
        prop_assert_eq!(first.skills(), second.skills());
        prop_assert_eq!(first.hit_points(), second.hit_points());

        let total: i32 = levels.iter().sum();
        let con = ability_modifier(scores[2]);
        prop_assert_eq!(first.total_level(), total);
        prop_assert_eq!(first.hit_points().max, 12 + con * total);
        prop_assert_eq!(first.ability_score(Ability::Dexterity), scores[1] + 1);
    }
}
