//! Node identity and canonical minimal serialization.
//!
//! Entities carrying a catalog name (tables, columns, indexes) are identified
//! by `tag + name`, so their content may change while they keep matching
//! across snapshots. Anonymous entities are identified by their full
//! min-string: any content change turns them into a different entity.

use crate::node::SchemaNode;

/// Attribute holding an entity's catalog name.
pub const NAME_ATTRIBUTE: &str = "name";

/// Name substituted when looking up a named entity without a name.
pub const DEFAULT_NAME: &str = "default";

/// Identity string of a named entity of kind `tag`.
pub fn named_identity(tag: &str, name: Option<&str>) -> String {
    let name = name.unwrap_or(DEFAULT_NAME);
    let mut out = String::with_capacity(tag.len() + name.len());
    out.push_str(tag);
    out.push_str(name);
    out
}

impl SchemaNode {
    /// Derived identity used to match this node across snapshots.
    ///
    /// Recomputed on every call from the current contents.
    pub fn unique_name(&self) -> String {
        match self.attribute(NAME_ATTRIBUTE) {
            Some(name) => named_identity(&self.tag, Some(name)),
            None => self.min_string(),
        }
    }

    /// Compact canonical encoding of the whole subtree.
    ///
    /// Equal min-strings mean equal tags, attributes and children, child order
    /// included.
    pub fn min_string(&self) -> String {
        let mut out = String::new();
        self.write_min_string(&mut out);
        out
    }

    fn write_min_string(&self, out: &mut String) {
        out.push_str("\tE");
        push_escaped(out, &self.tag);
        out.push('\t');
        for (key, value) in &self.attributes {
            out.push('\t');
            push_escaped(out, key);
            out.push('\t');
            push_escaped(out, value);
        }
        out.push_str("\t[");
        for child in &self.children {
            child.write_min_string(out);
        }
        // Closing marker keeps `r[a[b]]` and `r[a, b]` apart.
        out.push_str("\t]");
    }
}

/// Escape the separator characters so field boundaries stay unambiguous.
fn push_escaped(out: &mut String, text: &str) {
    if !text.contains(['\t', '\\']) {
        out.push_str(text);
        return;
    }
    for ch in text.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
}
