//! Inventory classification.

use crate::actions::compare_names;
use crate::record::{Item, ItemDefinition};
use serde::{Deserialize, Serialize};

/// Filter types that are used up.
pub const CONSUMABLE_FILTERS: [&str; 2] = ["Potion", "Scroll"];

/// Filter types that get the `"Combat"` tag.
pub const COMBAT_FILTERS: [&str; 4] = ["Weapon", "Armor", "Ammunition", "Shield"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Consumable,
    Gear,
}

impl ItemType {
    pub fn of(definition: &ItemDefinition) -> Self {
        if definition.is_consumable || is_one_of(&definition.filter_type, &CONSUMABLE_FILTERS) {
            ItemType::Consumable
        } else {
            ItemType::Gear
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub quantity: i32,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub tags: Vec<String>,
}

impl From<&Item> for InventoryItem {
    fn from(item: &Item) -> Self {
        let def = &item.definition;
        let mut tags: Vec<String> = [Some(def.filter_type.as_str()), def.sub_type.as_deref()]
            .into_iter()
            .flatten()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if is_one_of(&def.filter_type, &COMBAT_FILTERS) {
            tags.push("Combat".to_string());
        }

        Self {
            id: item.id,
            name: def.name.clone(),
            quantity: item.quantity,
            description: def.description.clone(),
            item_type: ItemType::of(def),
            tags,
        }
    }
}

fn is_one_of(filter_type: &str, names: &[&str]) -> bool {
    names.iter().any(|n| filter_type.eq_ignore_ascii_case(n))
}

/// Every item in the inventory, equipped or not, sorted by name.
pub fn classify(items: &[Item]) -> Vec<InventoryItem> {
    let mut out: Vec<InventoryItem> = items.iter().map(InventoryItem::from).collect();
    out.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(value: serde_json::Value) -> Vec<Item> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_classify() {
        let inventory = classify(&items(json!([
            {"id": 3, "quantity": 2, "definition": {"name": "Potion of Healing", "filterType": "Potion"}},
            {"id": 1, "quantity": 1, "definition": {"name": "longsword", "filterType": "Weapon", "subType": "Martial"}},
            {"id": 2, "quantity": 20, "definition": {"name": "Rations", "filterType": "Other Gear", "isConsumable": true}},
            {"id": 4, "quantity": 1, "definition": {"name": "Bedroll", "filterType": "Other Gear"}}
        ])));

        let names: Vec<_> = inventory.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bedroll", "longsword", "Potion of Healing", "Rations"]);

        assert_eq!(inventory[0].item_type, ItemType::Gear);
        assert_eq!(inventory[1].tags, vec!["Weapon", "Martial", "Combat"]);
        assert_eq!(inventory[2].item_type, ItemType::Consumable);
        assert_eq!(inventory[2].quantity, 2);
        assert_eq!(inventory[3].item_type, ItemType::Consumable);
    }

    #[test]
    fn test_missing_filter_type_has_no_tags() {
        let inventory = classify(&items(json!([{"id": 9, "definition": {"name": "Mystery"}}])));
        assert!(inventory[0].tags.is_empty());
        assert_eq!(inventory[0].item_type, ItemType::Gear);
    }

    #[test]
    fn test_serialized_type_field() {
        let item = InventoryItem::from(&items(json!([{"definition": {"name": "Scroll of Light", "filterType": "Scroll"}}]))[0]);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "Consumable");
    }
}
