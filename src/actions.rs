//! The action list: feature actions plus one attack per equipped weapon.

use crate::ability::{signed, Ability};
use crate::modifier::{GrantRule, Modifier, SourceCategory};
use crate::record::{ActionEntry, Activation, Character, Item, ItemDefinition};
use crate::scope::StatScope;
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::trace;

/// Reach assumed for a weapon that does not state a range.
pub const DEFAULT_WEAPON_RANGE: i32 = 5;

/// Weapon `categoryId` for simple weapons, which monks can use.
pub const SIMPLE_WEAPON_CATEGORY: i64 = 1;

/// Item attack type for melee weapons.
pub const MELEE_ATTACK: i64 = 1;

/// Item attack type for ranged weapons.
pub const RANGED_ATTACK: i64 = 2;

/// How long something takes to use, from an `activationType` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationKind {
    Action,
    Bonus,
    Reaction,
    Other,
}

impl ActivationKind {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => ActivationKind::Action,
            Some(3) => ActivationKind::Bonus,
            Some(4) => ActivationKind::Reaction,
            _ => ActivationKind::Other,
        }
    }

    pub fn of(activation: Option<&Activation>) -> Self {
        Self::from_code(activation.and_then(|a| a.activation_type))
    }

    /// Label for a casting time, e.g. "Bonus Action".
    pub fn label(self) -> &'static str {
        match self {
            ActivationKind::Action => "Action",
            ActivationKind::Bonus => "Bonus Action",
            ActivationKind::Reaction => "Reaction",
            ActivationKind::Other => "Other",
        }
    }
}

/// One row of the action list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ActivationKind,
    pub source: String,
    /// Signed to-hit, a save DC, or the limited-use label.
    pub hit_or_dc: String,
    pub damage: String,
    pub range: String,
    pub attack_type: String,
}

/// Where a weapon's item bonus to hit comes from, tried in
/// [`AttackBonusStrategy::ORDER`]. The `magic` flag is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackBonusStrategy {
    /// A numeric `attackBonus` on the definition.
    ExplicitAttackBonus,
    Enhancement,
    EnhancementBonus,
    /// Granted `bonus` modifiers aimed at attack rolls, or at nothing in
    /// particular (an empty `subType`).
    GrantedModifiers,
}

impl AttackBonusStrategy {
    pub const ORDER: [AttackBonusStrategy; 4] = [
        AttackBonusStrategy::ExplicitAttackBonus,
        AttackBonusStrategy::Enhancement,
        AttackBonusStrategy::EnhancementBonus,
        AttackBonusStrategy::GrantedModifiers,
    ];

    pub fn try_resolve(self, definition: &ItemDefinition) -> Option<i32> {
        match self {
            AttackBonusStrategy::ExplicitAttackBonus => definition.attack_bonus,
            AttackBonusStrategy::Enhancement => definition.enhancement,
            AttackBonusStrategy::EnhancementBonus => definition.enhancement_bonus,
            AttackBonusStrategy::GrantedModifiers => {
                let bonuses: Vec<i32> = definition
                    .granted_modifiers
                    .iter()
                    .map(|raw| Modifier::from_raw(raw, SourceCategory::Item))
                    .filter(|m| GrantRule::Granted.admits(&m.provenance))
                    .filter(|m| {
                        m.sub_type.is_empty()
                            || m.sub_type.contains("attack")
                            || m.sub_type.contains("to-hit")
                    })
                    .filter_map(|m| m.bonus_value())
                    .collect();
                (!bonuses.is_empty())
                    .then(|| bonuses.iter().fold(0i32, |sum, b| sum.saturating_add(*b)))
            }
        }
    }

    /// The first strategy that applies, or 0.
    pub fn resolve(definition: &ItemDefinition) -> i32 {
        for strategy in Self::ORDER {
            if let Some(bonus) = strategy.try_resolve(definition) {
                trace!(item = %definition.name, ?strategy, bonus, "weapon item bonus");
                return bonus;
            }
        }
        0
    }
}

/// Build the full, sorted action list.
pub fn build_actions<S: StatScope + ?Sized>(character: &Character, scope: &S) -> Vec<Action> {
    let lists: [(&[ActionEntry], &str); 5] = [
        (character.actions.race.as_slice(), "Race Feature"),
        (character.actions.feat.as_slice(), "Feat"),
        (character.actions.item.as_slice(), "Item"),
        (character.actions.class.as_slice(), "Class Feature"),
        (character.custom_actions.as_slice(), "Custom"),
    ];

    let mut actions: Vec<Action> = lists
        .iter()
        .flat_map(|(entries, source)| entries.iter().map(move |e| feature_action(e, source, scope)))
        .collect();
    actions.extend(
        character
            .inventory
            .iter()
            .filter_map(|item| weapon_attack(item, scope)),
    );

    actions.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    actions
}

pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn feature_action<S: StatScope + ?Sized>(entry: &ActionEntry, source: &str, scope: &S) -> Action {
    let mut hit_or_dc = entry
        .limited_use
        .as_ref()
        .filter(|u| u.max_uses > 0)
        .map(|u| format!("({}/{})", u.max_uses.saturating_sub(u.number_used), u.max_uses))
        .unwrap_or_default();

    let attack_total = entry.attack_bonus_modifier_total.filter(|v| *v != 0);
    if entry.is_attack || attack_total.is_some() {
        let proficiency = if entry.is_proficient {
            scope.proficiency_bonus()
        } else {
            0
        };
        let ability = match entry.ability_modifier_stat_id.and_then(Ability::from_id) {
            Some(ability) => scope.ability_modifier(ability),
            None => default_attack_modifier(scope),
        };
        hit_or_dc = signed(
            attack_total
                .unwrap_or(0)
                .saturating_add(proficiency)
                .saturating_add(ability),
        );
    }

    let damage = entry
        .dice
        .as_ref()
        .and_then(|d| d.dice_string.as_deref())
        .map(normalize)
        .unwrap_or_default();

    Action {
        id: entry.id.clone().unwrap_or_else(|| entry.name.clone()),
        name: entry.name.clone(),
        description: entry
            .snippet
            .clone()
            .or_else(|| entry.description.clone())
            .unwrap_or_default(),
        kind: ActivationKind::of(entry.activation.as_ref()),
        source: source.to_string(),
        hit_or_dc,
        damage,
        range: entry
            .range
            .filter(|r| *r > 0)
            .map(|r| format!("{r}ft"))
            .unwrap_or_default(),
        attack_type: source.to_string(),
    }
}

/// STR, or the better of STR and DEX for a Monk.
fn default_attack_modifier<S: StatScope + ?Sized>(scope: &S) -> i32 {
    let strength = scope.ability_modifier(Ability::Strength);
    if scope.has_class("Monk") {
        strength.max(scope.ability_modifier(Ability::Dexterity))
    } else {
        strength
    }
}

fn weapon_attack<S: StatScope + ?Sized>(item: &Item, scope: &S) -> Option<Action> {
    if !item.equipped {
        return None;
    }
    let def = &item.definition;
    let is_staff = def.filter_type.eq_ignore_ascii_case("Staff");
    let is_weapon = def.is_weapon || def.filter_type.eq_ignore_ascii_case("Weapon");
    let is_wondrous_attack =
        def.filter_type.eq_ignore_ascii_case("Wondrous item") && def.dice_string().is_some();
    if !(is_weapon || is_staff || is_wondrous_attack) {
        return None;
    }

    let strength = scope.ability_modifier(Ability::Strength);
    let dexterity = scope.ability_modifier(Ability::Dexterity);
    let is_ranged = def.attack_type == Some(RANGED_ATTACK) || def.range.is_some_and(|r| r > 5);
    let is_finesse = def.has_property("Finesse");
    let monk_usable = scope.has_class("Monk")
        && (def.is_monk_weapon || is_staff || def.category_id == Some(SIMPLE_WEAPON_CATEGORY));
    let use_dex = is_ranged || ((is_finesse || monk_usable) && dexterity >= strength);
    let modifier = if use_dex { dexterity } else { strength };
    trace!(item = %def.name, use_dex, modifier, "weapon ability");

    let to_hit = scope
        .proficiency_bonus()
        .saturating_add(modifier)
        .saturating_add(AttackBonusStrategy::resolve(def));
    let modifier_text = if modifier == 0 { String::new() } else { signed(modifier) };
    let damage = match def.dice_string() {
        Some(dice) => {
            let kind = def.damage_type.as_deref().unwrap_or_default();
            format!("{}{modifier_text} {kind}", normalize(dice)).trim_end().to_string()
        }
        None if is_staff => format!("1d6{modifier_text} Bludgeoning"),
        None => String::new(),
    };

    let attack_type = if is_staff || def.attack_type == Some(MELEE_ATTACK) {
        "Melee Weapon"
    } else if def.attack_type == Some(RANGED_ATTACK) {
        "Ranged Weapon"
    } else {
        "Weapon Attack"
    };
    let range = def.range.filter(|r| *r > 0).unwrap_or(DEFAULT_WEAPON_RANGE);

    Some(Action {
        id: item.id.to_string(),
        name: def.name.clone(),
        description: def.description.clone(),
        kind: ActivationKind::Action,
        source: "Weapon".to_string(),
        hit_or_dc: signed(to_hit),
        damage,
        range: format!("{range}ft"),
        attack_type: attack_type.to_string(),
    })
}
