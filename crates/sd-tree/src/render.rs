//! Human-readable tree dump for diagnostics. Not a stable format.

use std::fmt;

use crate::node::SchemaNode;

impl SchemaNode {
    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "ELEMENT: {}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, "\n{:width$}{key} = {value}", "", width = indent + 2)?;
        }
        if !self.children.is_empty() {
            write!(f, "\n{:width$}[", "", width = indent)?;
            for child in &self.children {
                write!(f, "\n{:width$}", "", width = indent + 2)?;
                child.render(f, indent + 2)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}
