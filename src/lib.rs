//! # charstat - Deterministic character sheet derivation
//!
//! Turns a raw, loosely structured tabletop character record into the
//! numbers a player needs at the table:
//! - ability scores and modifiers, proficiency bonus
//! - skills and saving throws, with saving-throw provenance for multiclassing
//! - hit points, armor class, initiative and passive scores
//! - reconciled spell slots, actions, spells and inventory
//! - descriptions with their `{{…}}` formulas filled in
//!
//! ## Core Concepts
//!
//! ### Stat Pipeline
//!
//! Every derived number is a stat in a dependency graph:
//!
//! ```text
//! [Character] → [ModifierSet] → [StatSource]/[StatTransform] → [StatResolver] → [StatTable]
//! ```
//!
//! 1. **Modifiers** are typed once, with their provenance
//! 2. **Sources** contribute additive base values (a class level, a +1 shield)
//! 3. **Transforms** read other stats (DEX modifier into AC) and run in
//!    additive, floor and override phases
//! 4. **ResolvedStat** keeps the final value with its full breakdown
//!
//! The resolver orders stats topologically and rejects cycles, so the same
//! record always yields the same sheet.
//!
//! ## Example
//!
//! ```rust
//! use charstat::*;
//!
//! let character = Character::from_json(r#"{
//!     "data": {
//!         "stats": [{"id": 1, "value": 16}, {"id": 2, "value": 14}],
//!         "classes": [{"level": 5, "isStartingClass": true,
//!                      "definition": {"name": "Fighter"}}],
//!         "inventory": [{"equipped": true, "definition": {
//!             "name": "Chain Shirt", "filterType": "Armor",
//!             "armorClass": 13, "armorTypeId": 2
//!         }}]
//!     }
//! }"#).unwrap();
//!
//! let sheet = CharacterSheet::derive(&character).unwrap();
//! assert_eq!(sheet.proficiency_bonus(), 3);
//! assert_eq!(sheet.armor_class(), 15);
//! assert_eq!(sheet.initiative(), 2);
//!
//! let ac = sheet.breakdown(&StatId::armor_class()).unwrap();
//! println!("{}", ac.explain());
//! ```
//!
//! ## Modules
//!
//! - [`record`] - Tolerant character record ingestion
//! - [`modifier`] - Typed modifiers and grant rules
//! - [`ability`] - Abilities, skills and the fixed game tables
//! - [`stat_id`], [`source`], [`transform`], [`graph`], [`resolver`], [`resolved`] - The stat engine
//! - [`provenance`] - Starting-class detection and save grant provenance
//! - [`armor`] - Equipped armor state
//! - [`slots`] - Spell slot reconciliation
//! - [`actions`], [`spells`], [`summon`], [`inventory`] - List builders
//! - [`expression`], [`context`], [`scope`] - Embedded formula resolution
//! - [`sheet`] - The derived sheet and its view models
//! - [`error`] - Error types

pub mod ability;
pub mod actions;
pub mod armor;
pub mod context;
pub mod error;
pub mod expression;
pub mod graph;
pub mod inventory;
pub mod modifier;
pub mod provenance;
pub mod record;
pub mod resolved;
pub mod resolver;
pub mod scope;
pub mod sheet;
pub mod slots;
pub mod source;
pub mod spells;
pub mod stat_id;
pub mod summon;
pub mod text;
pub mod transform;

// Re-export main types for convenience
pub use ability::{Ability, ProficiencyLevel, Skill};
pub use actions::{Action, ActivationKind};
pub use context::TextContext;
pub use error::SheetError;
pub use inventory::{InventoryItem, ItemType};
pub use modifier::{GrantRule, Modifier, ModifierKind, ModifierSet, SourceCategory};
pub use record::Character;
pub use resolved::{ResolvedStat, StatTable};
pub use resolver::StatResolver;
pub use scope::StatScope;
pub use sheet::{
    AbilityScore, CharacterHp, CharacterSheet, CharacterSummary, PassiveScores, SavingThrow,
    SkillScore,
};
pub use slots::SpellSlot;
pub use source::StatSource;
pub use spells::Spell;
pub use stat_id::{StatId, StatValue};
pub use summon::SummonStats;
pub use transform::{StatTransform, TransformPhase};
