//! Context for resolving embedded text expressions.
//!
//! The same `{{classlevel}}` token means different things depending on
//! whose text it sits in. `TextContext` carries that ownership (the class
//! and feature a description belongs to) into the expression resolver.
//! It does not interpret anything itself.

use serde::{Deserialize, Serialize};

/// Where a piece of descriptive text came from.
///
/// # Examples
///
/// ```rust
/// use charstat::TextContext;
///
/// let context = TextContext::new()
///     .with_class("Rogue")
///     .with_feature("Sneak Attack");
///
/// assert_eq!(context.class_name(), Some("Rogue"));
/// assert!(context.mentions("sneak attack"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContext {
    class_name: Option<String>,
    feature_name: Option<String>,
}

impl TextContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text owned by a class (a class action, a class feature description).
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Text owned by a named feature or action.
    pub fn with_feature(mut self, feature_name: impl Into<String>) -> Self {
        self.feature_name = Some(feature_name.into());
        self
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn feature_name(&self) -> Option<&str> {
        self.feature_name.as_deref()
    }

    /// Case-insensitive search of the class and feature names.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [self.class_name(), self.feature_name()]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let context = TextContext::new();
        assert_eq!(context.class_name(), None);
        assert_eq!(context.feature_name(), None);
        assert!(!context.mentions("monk"));
    }

    #[test]
    fn test_mentions_is_case_insensitive() {
        let context = TextContext::new().with_feature("Martial Arts");
        assert!(context.mentions("MARTIAL"));
        assert!(!context.mentions("sneak attack"));
    }
}
