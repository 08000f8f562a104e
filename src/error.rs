//! Error types for character derivation.
//!
//! Data problems in a character record never surface here: missing
//! collections, loose identifiers and unresolvable text tokens all degrade
//! silently. `SheetError` covers malformed documents at the ingestion
//! boundary and violations of the stat-graph invariants.

use crate::stat_id::StatId;
use thiserror::Error;

/// Format a cycle path as a readable string.
fn format_cycle_path(path: &[StatId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors that can occur while ingesting a record or resolving its stats.
///
/// # Examples
///
/// ```rust
/// use charstat::{SheetError, StatId};
///
/// let err = SheetError::MissingStat(StatId::from_str("armor-class"));
/// assert_eq!(err.to_string(), "No stat registered: armor-class");
/// ```
#[derive(Debug, Error)]
pub enum SheetError {
    /// A dependency cycle was detected in the stat graph.
    ///
    /// The path starts and ends on the same stat, e.g. `[A, B, A]`.
    #[error("Cycle detected: {}", format_cycle_path(.path))]
    Cycle { path: Vec<StatId> },

    /// A transform read a stat that was not resolved before it.
    #[error("Missing dependency: {0}")]
    MissingDependency(StatId),

    /// A stat was requested that has no sources or transforms.
    #[error("No stat registered: {0}")]
    MissingStat(StatId),

    /// The character document is not valid JSON or has the wrong shape.
    #[error("Malformed character record: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SheetError::MissingDependency(StatId::from_str("dexterity-modifier"));
        assert!(err.to_string().contains("dexterity-modifier"));
    }

    #[test]
    fn test_cycle_error_display() {
        let a = StatId::from_str("armor-class");
        let b = StatId::from_str("initiative");
        let err = SheetError::Cycle {
            path: vec![a.clone(), b, a],
        };
        assert_eq!(
            err.to_string(),
            "Cycle detected: armor-class -> initiative -> armor-class"
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SheetError = json_err.into();
        assert!(matches!(err, SheetError::Parse(_)));
    }
}
