//! Diff computation: compare two schema trees and produce a [`SchemaDelta`].
//!
//! Children are matched by unique name as set members; sibling position plays
//! no part in matching and is captured separately as the target order.

use std::collections::BTreeMap;

use sd_tree::SchemaNode;
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::delta::SchemaDelta;
use crate::error::{DiffError, DiffResult};

/// Compute the delta that turns `before` into `after`, with default settings.
///
/// Returns `Ok(None)` when the roots have different unique names: the trees
/// describe different entities and the caller should replace the whole tree.
pub fn compute_diff(before: &SchemaNode, after: &SchemaNode) -> DiffResult<Option<SchemaDelta>> {
    compute_diff_with(before, after, &EngineConfig::default())
}

/// Compute the delta that turns `before` into `after`.
pub fn compute_diff_with(
    before: &SchemaNode,
    after: &SchemaNode,
    config: &EngineConfig,
) -> DiffResult<Option<SchemaDelta>> {
    let name = before.unique_name();
    let after_name = after.unique_name();
    if name != after_name {
        debug!(before = %name, after = %after_name, "roots are incomparable; no delta");
        return Ok(None);
    }

    let delta = diff_nodes(name, before, after, config, 0).inspect_err(|e| {
        warn!(error = %e, "diff rejected");
    })?;
    debug!(
        root = %delta.name,
        changes = delta.change_count(),
        depth = delta.depth(),
        "delta computed"
    );
    Ok(Some(delta))
}

fn diff_nodes(
    name: String,
    before: &SchemaNode,
    after: &SchemaNode,
    config: &EngineConfig,
    depth: usize,
) -> DiffResult<SchemaDelta> {
    if depth > config.max_depth {
        return Err(DiffError::DepthExceeded {
            limit: config.max_depth,
        });
    }

    if before.tag != after.tag {
        return Err(DiffError::IdentityCollision {
            name,
            before_tag: before.tag.clone(),
            after_tag: after.tag.clone(),
        });
    }

    let mut delta = SchemaDelta::new(name);
    // Structural equality coincides with min-string equality.
    if before == after {
        return Ok(delta);
    }

    let before_names = before.child_names();
    let after_names = after.child_names();
    reject_duplicates(&delta.name, before)?;
    reject_duplicates(&delta.name, after)?;

    delta.element_order = Some(
        after_names
            .iter()
            .enumerate()
            .map(|(index, child)| (child.clone(), index))
            .collect(),
    );

    diff_attributes(before, after, &mut delta);

    let before_index = index_children(before, &before_names);
    let after_index = index_children(after, &after_names);

    for (child, child_name) in before.children.iter().zip(&before_names) {
        if !after_index.contains_key(child_name.as_str()) {
            delta.removed_children.push(child.clone());
        }
    }
    for (child, child_name) in after.children.iter().zip(&after_names) {
        if !before_index.contains_key(child_name.as_str()) {
            delta.added_children.push(child.clone());
        }
    }

    for (child_name, old_child) in &before_index {
        let Some(new_child) = after_index.get(child_name) else {
            continue;
        };
        let nested = diff_nodes(child_name.to_string(), old_child, new_child, config, depth + 1)?;
        if !nested.is_unchanged() {
            delta.changed_children.insert(child_name.to_string(), nested);
        }
    }

    trace!(
        node = %delta.name,
        added = delta.added_children.len(),
        removed = delta.removed_children.len(),
        changed = delta.changed_children.len(),
        "level diffed"
    );
    Ok(delta)
}

fn diff_attributes(before: &SchemaNode, after: &SchemaNode, delta: &mut SchemaDelta) {
    for (key, old_value) in &before.attributes {
        match after.attributes.get(key) {
            Some(new_value) => {
                if old_value != new_value {
                    delta.changed_attributes.insert(key.clone(), new_value.clone());
                }
            }
            None => {
                delta.removed_attributes.insert(key.clone());
            }
        }
    }
    for (key, new_value) in &after.attributes {
        if !before.attributes.contains_key(key) {
            delta.added_attributes.insert(key.clone(), new_value.clone());
        }
    }
}

/// Map each sibling unique name to its holder. Names are unique here.
fn index_children<'a>(
    node: &'a SchemaNode,
    names: &'a [String],
) -> BTreeMap<&'a str, &'a SchemaNode> {
    node.children
        .iter()
        .zip(names)
        .map(|(child, name)| (name.as_str(), child))
        .collect()
}

fn reject_duplicates(parent: &str, node: &SchemaNode) -> DiffResult<()> {
    match node.duplicate_child_names().into_iter().next() {
        Some(name) => Err(DiffError::DuplicateIdentity {
            parent: parent.to_string(),
            name,
        }),
        None => Ok(()),
    }
}
