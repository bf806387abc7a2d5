//! Graph Options
//!
//! Policies for the cases where a mutation request is well-formed but could
//! reasonably be read two ways. Options are plain data and can be loaded
//! from JSON:
//!
//! ```rust
//! use trellis_core::config::{GraphOptions, UnknownReplacement};
//!
//! let options = GraphOptions::from_json(r#"{ "unknown_replacement": "reject" }"#).unwrap();
//! assert_eq!(options.unknown_replacement, UnknownReplacement::Reject);
//! ```

use serde::{Deserialize, Serialize};

/// What `replace_node` does with a node whose id is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownReplacement {
    /// Insert it as part of the same validated batch. Only a `node-added`
    /// event is emitted for it.
    #[default]
    Insert,

    /// Fail the whole batch with [`GraphError::UnknownNode`].
    ///
    /// [`GraphError::UnknownNode`]: crate::error::GraphError::UnknownNode
    Reject,
}

/// What happens to a dependency declared more than once by the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateDeps {
    /// Store the list as declared. Repeats are redundant work during
    /// resolution and never an error.
    #[default]
    Keep,

    /// Collapse repeats to their first occurrence before validating and
    /// storing.
    Dedup,
}

/// Per-graph policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub unknown_replacement: UnknownReplacement,
    pub duplicate_deps: DuplicateDeps,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unknown_replacement(mut self, policy: UnknownReplacement) -> Self {
        self.unknown_replacement = policy;
        self
    }

    pub fn duplicate_deps(mut self, policy: DuplicateDeps) -> Self {
        self.duplicate_deps = policy;
        self
    }

    /// Parse options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_insert_and_keep() {
        let options = GraphOptions::default();
        assert_eq!(options.unknown_replacement, UnknownReplacement::Insert);
        assert_eq!(options.duplicate_deps, DuplicateDeps::Keep);
    }

    #[test]
    fn empty_json_uses_defaults() {
        assert_eq!(GraphOptions::from_json("{}").unwrap(), GraphOptions::default());
    }

    #[test]
    fn json_overrides_each_policy() {
        let options =
            GraphOptions::from_json(r#"{ "unknown_replacement": "reject", "duplicate_deps": "dedup" }"#)
                .unwrap();
        assert_eq!(
            options,
            GraphOptions::new()
                .unknown_replacement(UnknownReplacement::Reject)
                .duplicate_deps(DuplicateDeps::Dedup)
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(GraphOptions::from_json(r#"{ "duplicate_deps": "error" }"#).is_err());
    }
}
