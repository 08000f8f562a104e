//! Summon statblock extraction.
//!
//! Summoning spells embed the creature's statblock in their HTML
//! description. This pulls the headline numbers out of it so the sheet
//! can show them without rendering the whole block.

use crate::text::{collapse_whitespace, decode_entities, strip_tags};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder for a segment that could not be found.
pub const UNKNOWN: &str = "?";

/// Default for an ability number that could not be found.
pub const DEFAULT_ABILITY: &str = "10";

/// Headline numbers of a summoned creature. Values are kept as text since
/// statblocks write things like `"13 + PB (natural armor)"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonStats {
    pub name: String,
    pub ac: String,
    pub hp: String,
    pub speed: String,
    pub str: String,
    pub dex: String,
    pub con: String,
    pub int: String,
    pub wis: String,
    pub cha: String,
}

struct StatblockPatterns {
    armor_class: Regex,
    hit_points: Regex,
    speed: Regex,
    abilities: [Regex; 6],
}

const TERMINATORS: &str =
    r"(?:\b(?:Armor Class|Hit Points|Speed|STR|DEX|CON|INT|WIS|CHA|Senses|Languages|Challenge)\b|$)";

fn segment(label: &str) -> Regex {
    Regex::new(&format!(r"(?i){label}\s*([\w\s()+.,;:/'\-]+?)\s*{TERMINATORS}"))
        .expect("valid regex")
}

fn ability(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\b\s*(\d+)")).expect("valid regex")
}

static PATTERNS: Lazy<StatblockPatterns> = Lazy::new(|| StatblockPatterns {
    armor_class: segment("Armor Class"),
    hit_points: segment("Hit Points"),
    speed: segment("Speed"),
    abilities: ["STR", "DEX", "CON", "INT", "WIS", "CHA"].map(ability),
});

fn capture(pattern: &Regex, text: &str, default: &str) -> String {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a statblock out of a spell description.
///
/// Returns `None` unless the text mentions "Armor Class" or "Hit Points".
///
/// # Examples
///
/// ```rust
/// use charstat::summon::parse_summon_stats;
///
/// let html = "<p><strong>Armor Class</strong> 13 (natural armor)</p>\
///             <p><strong>Hit Points</strong> 30</p>\
///             <p><strong>Speed</strong> 30 ft., climb 30 ft.</p>\
///             <p>STR 18 (+4) DEX 11 (+0) CON 16 (+3)</p>";
///
/// let stats = parse_summon_stats(html).unwrap();
/// assert_eq!(stats.ac, "13 (natural armor)");
/// assert_eq!(stats.hp, "30");
/// assert_eq!(stats.speed, "30 ft., climb 30 ft.");
/// assert_eq!(stats.str, "18");
/// assert_eq!(stats.wis, "10");
///
/// assert!(parse_summon_stats("You conjure a floating disk.").is_none());
/// ```
pub fn parse_summon_stats(description: &str) -> Option<SummonStats> {
    let text = collapse_whitespace(&decode_entities(&strip_tags(description)));
    if !text.contains("Armor Class") && !text.contains("Hit Points") {
        return None;
    }

    let patterns = &*PATTERNS;
    let [str, dex, con, int, wis, cha] =
        [0usize, 1, 2, 3, 4, 5].map(|i| capture(&patterns.abilities[i], &text, DEFAULT_ABILITY));

    Some(SummonStats {
        name: "Summoned Creature".to_string(),
        ac: capture(&patterns.armor_class, &text, UNKNOWN),
        hp: capture(&patterns.hit_points, &text, UNKNOWN),
        speed: capture(&patterns.speed, &text, UNKNOWN),
        str,
        dex,
        con,
        int,
        wis,
        cha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_segments_are_unknown() {
        let stats = parse_summon_stats("<p>Hit Points equal to five times your level</p>").unwrap();
        assert_eq!(stats.ac, UNKNOWN);
        assert_eq!(stats.hp, "equal to five times your level");
        assert_eq!(stats.speed, UNKNOWN);
        assert_eq!(stats.cha, DEFAULT_ABILITY);
    }

    #[test]
    fn test_segments_stop_at_next_label() {
        let stats = parse_summon_stats(
            "Armor Class 11 + the level of the spell Hit Points 40 Speed 40 ft. STR 12 DEX 14 CON 13 INT 5 WIS 12 CHA 6 Senses darkvision",
        )
        .unwrap();
        assert_eq!(stats.ac, "11 + the level of the spell");
        assert_eq!(stats.hp, "40");
        assert_eq!(stats.speed, "40 ft.");
        assert_eq!(
            [stats.str, stats.dex, stats.con, stats.int, stats.wis, stats.cha],
            ["12", "14", "13", "5", "12", "6"]
        );
    }

    #[test]
    fn test_requires_marker_text() {
        assert!(parse_summon_stats("").is_none());
        assert!(parse_summon_stats("<p>STR 10</p>").is_none());
    }
}
