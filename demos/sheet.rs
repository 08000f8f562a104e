//! Sheet example: derive a multiclass character and print every section
//!
//! This example demonstrates:
//! - Ingesting an enveloped, loosely typed record
//! - Saving-throw provenance for a Fighter/Wizard multiclass
//! - Stat breakdowns, spell slots, actions, spells and inventory
//! - Filling in embedded formulas
//!
//! Run with `RUST_LOG=charstat=trace` to see every strategy decision.

use charstat::*;
use serde_json::json;

fn main() -> Result<(), SheetError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let record = json!({"data": {
        "id": "9001",
        "name": "Ser Alaric",
        "stats": [
            {"id": 1, "value": 16}, {"id": 2, "value": 12}, {"id": 3, "value": 14},
            {"id": 4, "value": 15}, {"id": 5, "value": 10}, {"id": 6, "value": 8}
        ],
        "classes": [
            {"id": 1, "level": 5, "isStartingClass": true,
             "definition": {"id": 10, "name": "Fighter"},
             "subclassDefinition": {"name": "Eldritch Knight"},
             "classFeatures": [{"definition": {"id": 100, "name": "Proficiencies", "requiredLevel": 1}}]},
            {"id": 2, "level": 3,
             "definition": {"id": 20, "name": "Wizard", "spellCastingAbilityId": 4,
                 "spellRules": {"levelSpellSlots": [[], [2], [3], [4, 2]]}},
             "classFeatures": [{"definition": {"id": 200, "name": "Proficiencies", "requiredLevel": 1}}]}
        ],
        "modifiers": {
            "class": [
                {"type": "proficiency", "subType": "strength-saving-throws", "componentId": 100},
                {"type": "proficiency", "subType": "constitution-saving-throws", "componentId": 100},
                {"type": "proficiency", "subType": "intelligence-saving-throws", "componentId": 200},
                {"type": "proficiency", "subType": "athletics"}
            ],
            "item": [{"type": "bonus", "subType": "armor-class", "value": 1, "isGranted": true}]
        },
        "baseHitPoints": 58,
        "removedHitPoints": 12,
        "inventory": [
            {"id": 1, "equipped": true, "quantity": 1, "definition": {
                "name": "Half Plate", "filterType": "Armor", "armorTypeId": 2, "armorClass": 15}},
            {"id": 2, "equipped": true, "quantity": 1, "definition": {
                "name": "Longsword", "filterType": "Weapon", "attackType": 1,
                "damage": {"diceString": "1d8"}, "damageType": "Slashing", "enhancement": 1}},
            {"id": 3, "equipped": false, "quantity": 2, "definition": {
                "name": "Potion of Healing", "filterType": "Potion"}}
        ],
        "actions": {"class": [{
            "id": "second-wind", "name": "Second Wind",
            "activation": {"activationType": 3},
            "limitedUse": {"maxUses": 1, "numberUsed": 0},
            "snippet": "Regain 1d10 + {{classlevel}} hit points."
        }]},
        "classSpells": [{"characterClassId": 2, "spells": [
            {"prepared": true, "definition": {
                "name": "Shield", "level": 1, "school": "Abjuration",
                "activation": {"activationType": 4, "activationTime": 1}, "components": [1, 2]}},
            {"prepared": true, "definition": {
                "name": "Find Familiar", "level": 1, "school": "Conjuration",
                "activation": {"activationType": 1, "activationTime": 1},
                "description": "<p><strong>Armor Class</strong> 12</p><p><strong>Hit Points</strong> 1</p><p><strong>Speed</strong> 20 ft., fly 60 ft.</p><p>STR 3 DEX 15 CON 8 INT 2 WIS 12 CHA 7</p>"}}
        ]}],
        "spellSlots": [{"level": 1, "used": 2}]
    }});

    let character = Character::from_value(record)?;
    let sheet = CharacterSheet::derive(&character)?;

    let summary = sheet.summary();
    println!("=== {} ({}) ===\n", summary.name, summary.class_summary());

    println!("1. Abilities\n");
    for score in sheet.ability_scores() {
        println!("  {} {:>2} ({})", score.ability, score.score, ability::signed(score.modifier));
    }

    println!("\n2. Saving Throws\n");
    for save in sheet.saving_throws() {
        let marker = if save.is_proficient { "*" } else { " " };
        println!("  {marker} {:<12} {}", save.name, save.bonus);
    }

    println!("\n3. Combat\n");
    let hp = sheet.hit_points();
    println!("  HP {}/{} (+{} temp)", hp.current, hp.max, hp.temp);
    println!("  Initiative {}", ability::signed(sheet.initiative()));
    if let Some(ac) = sheet.breakdown(&StatId::armor_class()) {
        println!("  AC {}\n{}", ac.value, indent(&ac.explain()));
    }

    println!("\n4. Spell Slots\n");
    for slot in sheet.spell_slots() {
        println!("  Level {}: {}/{} available", slot.level, slot.available, slot.max);
    }

    println!("\n5. Actions\n");
    for action in sheet.actions() {
        let context = TextContext::new().with_class("Fighter").with_feature(&action.name);
        println!(
            "  {:<12} {:<8} {:<16} {}",
            action.name,
            action.hit_or_dc,
            action.damage,
            sheet.resolve_text(&action.description, &context)
        );
    }

    println!("\n6. Spells\n");
    for spell in sheet.spells() {
        println!("  [{}] {} ({}, {})", spell.level, spell.name, spell.casting_time, spell.school);
        if let Some(summon) = &spell.summon {
            println!("      summon: AC {} HP {} Speed {}", summon.ac, summon.hp, summon.speed);
        }
    }

    println!("\n7. Inventory\n");
    for item in sheet.inventory() {
        println!("  {} x{} {:?} {:?}", item.name, item.quantity, item.item_type, item.tags);
    }

    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
