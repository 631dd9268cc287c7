//! Undo history configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Limits and behavior of a document's undo history.
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
///
/// ```
/// use aether_document::UndoConfig;
///
/// let config = UndoConfig::from_json_str(r#"{"max_undo_groups": 50}"#).unwrap();
/// assert_eq!(config.max_undo_groups, 50);
/// assert!(config.coalesce_sets);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UndoConfig {
    /// Maximum number of committed groups kept on the undo stack
    /// (0 = unlimited). The oldest groups are evicted first.
    pub max_undo_groups: usize,
    /// Merge repeated value sets on one node within a group into a single
    /// action.
    pub coalesce_sets: bool,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_undo_groups: 0,
            coalesce_sets: true,
        }
    }
}

impl UndoConfig {
    /// Unlimited history with coalescing enabled.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Set the undo depth limit.
    #[must_use]
    pub fn with_max_undo_groups(mut self, max_undo_groups: usize) -> Self {
        self.max_undo_groups = max_undo_groups;
        self
    }

    /// Enable or disable set coalescing.
    #[must_use]
    pub fn with_coalesce_sets(mut self, coalesce_sets: bool) -> Self {
        self.coalesce_sets = coalesce_sets;
        self
    }

    /// Parse a configuration from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid JSON, has unknown fields,
    /// or has fields of the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `undo_depth` groups exceed the configured limit.
    pub(crate) fn exceeds_depth(&self, undo_depth: usize) -> bool {
        self.max_undo_groups > 0 && undo_depth > self.max_undo_groups
    }
}
