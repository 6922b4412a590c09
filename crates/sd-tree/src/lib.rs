//! Schema tree model for SchemaDelta.
//!
//! A catalog snapshot is held as a tree of [`SchemaNode`]s: a tag, a sorted
//! attribute map and an ordered list of owned children. Nodes are matched
//! across snapshots by a derived identity (see [`SchemaNode::unique_name`]),
//! never by position or pointer.
//!
//! # Key Types
//!
//! - [`SchemaNode`] -- Labeled tree node with identity and lookup helpers
//! - [`TreeDigest`] -- Domain-separated BLAKE3 digest of a subtree's min-string
//! - [`TreeError`] -- Errors from digest parsing

pub mod digest;
pub mod error;
pub mod identity;
pub mod node;
pub mod render;

pub use digest::TreeDigest;
pub use error::{TreeError, TreeResult};
pub use identity::{named_identity, DEFAULT_NAME, NAME_ATTRIBUTE};
pub use node::SchemaNode;
