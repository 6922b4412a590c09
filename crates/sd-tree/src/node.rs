use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::identity::named_identity;

/// A labeled node in a schema catalog tree.
///
/// The node exclusively owns its attributes and children. Attribute iteration
/// is always in sorted key order; child order is significant and preserved by
/// diff and patch. `Clone` is a full deep copy of the subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Kind of schema entity (`"table"`, `"column"`, ...).
    pub tag: String,
    /// String attributes, keyed uniquely.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Ordered child nodes.
    #[serde(default)]
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    /// Create a node with the given tag and no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.push_child(child);
        self
    }

    /// Set an attribute, returning the previous value if any.
    pub fn set_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.attributes.insert(key.into(), value.into())
    }

    /// Get an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Remove an attribute, returning its value if it was present.
    pub fn remove_attribute(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    /// Append a child at the end of the sibling list.
    pub fn push_child(&mut self, child: SchemaNode) {
        self.children.push(child);
    }

    /// Immediate children whose tag equals `tag`, in sibling order.
    pub fn find_children(&self, tag: &str) -> Vec<&SchemaNode> {
        self.children.iter().filter(|c| c.tag == tag).collect()
    }

    /// All descendants whose tag equals `tag`, depth-first pre-order.
    ///
    /// The node itself is not considered, only what lies beneath it.
    pub fn find_descendants(&self, tag: &str) -> Vec<&SchemaNode> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a SchemaNode>) {
        for child in &self.children {
            if child.tag == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }

    /// The first immediate child whose unique name equals `unique_name`.
    pub fn find_child(&self, unique_name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.unique_name() == unique_name)
    }

    /// Mutable variant of [`find_child`](Self::find_child).
    pub fn find_child_mut(&mut self, unique_name: &str) -> Option<&mut SchemaNode> {
        self.children
            .iter_mut()
            .find(|c| c.unique_name() == unique_name)
    }

    /// Sibling index of the first child whose unique name equals `unique_name`.
    pub fn position_of_child(&self, unique_name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.unique_name() == unique_name)
    }

    /// Find a named child by tag and `name` attribute.
    ///
    /// A missing name looks up the entity registered under
    /// [`DEFAULT_NAME`](crate::DEFAULT_NAME).
    pub fn find_named_child(&self, tag: &str, name: Option<&str>) -> Option<&SchemaNode> {
        self.find_child(&named_identity(tag, name))
    }

    /// Unique names of this node's children, in sibling order.
    pub fn child_names(&self) -> Vec<String> {
        self.children.iter().map(SchemaNode::unique_name).collect()
    }

    /// Sibling unique names that occur more than once, sorted.
    pub fn duplicate_child_names(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut dups = BTreeSet::new();
        for name in self.child_names() {
            if !seen.insert(name.clone()) {
                dups.insert(name);
            }
        }
        dups.into_iter().collect()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SchemaNode::node_count).sum::<usize>()
    }
}
