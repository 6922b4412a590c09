//! The delta between two matched schema nodes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sd_tree::SchemaNode;
use serde::{Deserialize, Serialize};

/// Differences between two nodes that share a unique name.
///
/// Mirrors the tree recursively: children present on both sides with internal
/// changes get a nested delta keyed by their unique name. Added and removed
/// subtrees are owned deep copies, independent of the trees they came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDelta {
    /// Unique name of the node this delta applies to.
    pub name: String,
    /// Subtrees present only in the after-state, in after-side sibling order.
    pub added_children: Vec<SchemaNode>,
    /// Subtrees present only in the before-state, in before-side sibling order.
    pub removed_children: Vec<SchemaNode>,
    /// Nested deltas for children present on both sides.
    pub changed_children: BTreeMap<String, SchemaDelta>,
    /// Attributes present only in the after-state.
    pub added_attributes: BTreeMap<String, String>,
    /// Attribute keys present only in the before-state.
    pub removed_attributes: BTreeSet<String>,
    /// Attributes whose value changed, with the new value.
    pub changed_attributes: BTreeMap<String, String>,
    /// Final sibling index of every after-side child, keyed by unique name.
    ///
    /// `None` marks an unchanged subtree: patching skips the reorder step.
    pub element_order: Option<BTreeMap<String, usize>>,
}

impl SchemaDelta {
    /// Create an empty delta for the node with the given unique name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            added_children: Vec::new(),
            removed_children: Vec::new(),
            changed_children: BTreeMap::new(),
            added_attributes: BTreeMap::new(),
            removed_attributes: BTreeSet::new(),
            changed_attributes: BTreeMap::new(),
            element_order: None,
        }
    }

    /// Returns `true` if no attribute or child content changes are recorded.
    ///
    /// The recorded order is not considered; see
    /// [`is_unchanged`](Self::is_unchanged).
    pub fn is_empty(&self) -> bool {
        self.added_children.is_empty()
            && self.removed_children.is_empty()
            && self.changed_children.is_empty()
            && self.added_attributes.is_empty()
            && self.removed_attributes.is_empty()
            && self.changed_attributes.is_empty()
    }

    /// Returns `true` if this is the "subtree unchanged" signal: no content
    /// changes and no recorded order.
    pub fn is_unchanged(&self) -> bool {
        self.is_empty() && self.element_order.is_none()
    }

    /// Returns `true` if the delta only reorders this node's children.
    pub fn is_reorder_only(&self) -> bool {
        self.is_empty() && self.element_order.is_some()
    }

    /// Number of attribute and child changes, counted recursively.
    ///
    /// An added or removed subtree counts once regardless of its size.
    pub fn change_count(&self) -> usize {
        self.added_children.len()
            + self.removed_children.len()
            + self.added_attributes.len()
            + self.removed_attributes.len()
            + self.changed_attributes.len()
            + self
                .changed_children
                .values()
                .map(SchemaDelta::change_count)
                .sum::<usize>()
    }

    /// Depth of nested deltas below this one (0 when none).
    pub fn depth(&self) -> usize {
        self.changed_children
            .values()
            .map(|d| 1 + d.depth())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for SchemaDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NAME: {}", self.name)?;
        writeln!(f, "ADDED: {:?}", self.added_attributes)?;
        writeln!(f, "REMOVED: {:?}", self.removed_attributes)?;
        writeln!(f, "CHANGED: {:?}", self.changed_attributes)?;
        if let Some(order) = &self.element_order {
            writeln!(f, "ORDER: {order:?}")?;
        }
        writeln!(f, "NEW CHILDREN:")?;
        for added in &self.added_children {
            writeln!(f, "{added}")?;
        }
        writeln!(f, "DEAD CHILDREN:")?;
        for removed in &self.removed_children {
            writeln!(f, "{removed}")?;
        }
        writeln!(f, "CHANGED CHILDREN:")?;
        for nested in self.changed_children.values() {
            write!(f, "{nested}")?;
        }
        writeln!(f)
    }
}
