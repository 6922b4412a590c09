//! Patch application: mutate a tree in place according to a [`SchemaDelta`].
//!
//! The whole delta is checked against the target before the first mutation,
//! so a failed patch leaves the target exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use sd_tree::{named_identity, SchemaNode, NAME_ATTRIBUTE};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::delta::SchemaDelta;
use crate::error::{PatchError, PatchResult};

/// Apply `delta` to `target` with default settings.
pub fn apply_diff(target: &mut SchemaNode, delta: &SchemaDelta) -> PatchResult<()> {
    apply_diff_with(target, delta, &EngineConfig::default())
}

/// Apply `delta` to `target`, cloning the added subtrees out of the delta.
pub fn apply_diff_with(
    target: &mut SchemaNode,
    delta: &SchemaDelta,
    config: &EngineConfig,
) -> PatchResult<()> {
    check(target, delta, config)?;
    patch_borrowed(target, delta);
    debug!(root = %delta.name, changes = delta.change_count(), "delta applied");
    Ok(())
}

/// Apply `delta` to `target` with default settings, moving the added
/// subtrees into the tree.
pub fn apply_diff_owned(target: &mut SchemaNode, delta: SchemaDelta) -> PatchResult<()> {
    apply_diff_owned_with(target, delta, &EngineConfig::default())
}

/// Apply `delta` to `target`, moving the added subtrees into the tree.
pub fn apply_diff_owned_with(
    target: &mut SchemaNode,
    delta: SchemaDelta,
    config: &EngineConfig,
) -> PatchResult<()> {
    check(target, &delta, config)?;
    let root = delta.name.clone();
    let changes = delta.change_count();
    patch_owned(target, delta);
    debug!(%root, changes, "delta applied");
    Ok(())
}

/// Check that `delta` applies cleanly to `target` without mutating it.
pub fn validate_diff(target: &SchemaNode, delta: &SchemaDelta) -> PatchResult<()> {
    check(target, delta, &EngineConfig::default())
}

fn check(target: &SchemaNode, delta: &SchemaDelta, config: &EngineConfig) -> PatchResult<()> {
    validate(target, delta, config.max_depth, 0).inspect_err(|e| {
        warn!(target = %delta.name, error = %e, "patch rejected; resync required");
    })
}

fn validate(
    target: &SchemaNode,
    delta: &SchemaDelta,
    limit: usize,
    depth: usize,
) -> PatchResult<()> {
    if depth > limit {
        return Err(PatchError::DepthExceeded { limit });
    }
    let actual = target.unique_name();
    if actual != delta.name {
        return Err(PatchError::TargetMismatch {
            expected: delta.name.clone(),
            actual,
        });
    }
    let touches_children = !delta.removed_children.is_empty()
        || !delta.changed_children.is_empty()
        || delta.element_order.is_some();
    if !touches_children {
        return Ok(());
    }

    let current = target.child_names();
    let mut by_name: BTreeMap<&str, &SchemaNode> = BTreeMap::new();
    for (child, name) in target.children.iter().zip(&current) {
        if by_name.insert(name.as_str(), child).is_some() {
            return Err(PatchError::DuplicateTargetChild {
                parent: delta.name.clone(),
                child: name.clone(),
            });
        }
    }

    let mut kept: BTreeSet<String> = current.iter().cloned().collect();
    for removed in &delta.removed_children {
        let name = removed.unique_name();
        if !kept.remove(&name) {
            return Err(PatchError::MissingChild {
                parent: delta.name.clone(),
                child: name,
            });
        }
    }

    for (name, nested) in &delta.changed_children {
        let child = match by_name.get(name.as_str()) {
            Some(child) if kept.contains(name) => *child,
            _ => {
                return Err(PatchError::MissingChild {
                    parent: delta.name.clone(),
                    child: name.clone(),
                })
            }
        };
        if !keeps_identity(child, nested) {
            return Err(PatchError::UnstableIdentity {
                parent: delta.name.clone(),
                child: name.clone(),
            });
        }
        validate(child, nested, limit, depth + 1)?;
    }

    if let Some(order) = &delta.element_order {
        let added: Vec<String> = delta
            .added_children
            .iter()
            .map(SchemaNode::unique_name)
            .collect();
        let total = kept.len() + added.len();
        if total != order.len() {
            return Err(PatchError::OrderCountMismatch {
                parent: delta.name.clone(),
                expected: order.len(),
                actual: total,
            });
        }
        let mut taken = vec![false; total];
        for name in kept.iter().chain(&added) {
            let Some(&index) = order.get(name) else {
                return Err(PatchError::UnorderedChild {
                    parent: delta.name.clone(),
                    child: name.clone(),
                });
            };
            if index >= total || taken[index] {
                return Err(PatchError::InvalidOrderIndex {
                    parent: delta.name.clone(),
                    child: name.clone(),
                    index,
                });
            }
            taken[index] = true;
        }
    }
    Ok(())
}

/// Whether `child` still derives the same unique name once `delta` is applied.
///
/// Only named children can change in place: an anonymous child's identity is
/// its whole content.
fn keeps_identity(child: &SchemaNode, delta: &SchemaDelta) -> bool {
    let name = if delta.removed_attributes.contains(NAME_ATTRIBUTE) {
        None
    } else {
        delta
            .changed_attributes
            .get(NAME_ATTRIBUTE)
            .or_else(|| delta.added_attributes.get(NAME_ATTRIBUTE))
            .map(String::as_str)
            .or_else(|| child.attribute(NAME_ATTRIBUTE))
    };
    name.is_some_and(|n| named_identity(&child.tag, Some(n)) == delta.name)
}

fn patch_borrowed(target: &mut SchemaNode, delta: &SchemaDelta) {
    apply_attributes(
        target,
        delta.added_attributes.clone(),
        delta.changed_attributes.clone(),
        &delta.removed_attributes,
    );
    remove_children(target, &delta.removed_children);

    let existing = target.children.len();
    target.children.extend(delta.added_children.iter().cloned());

    if !delta.changed_children.is_empty() {
        for child in &mut target.children[..existing] {
            if let Some(nested) = delta.changed_children.get(&child.unique_name()) {
                patch_borrowed(child, nested);
            }
        }
    }

    if let Some(order) = &delta.element_order {
        reorder(target, order);
    }
}

fn patch_owned(target: &mut SchemaNode, delta: SchemaDelta) {
    let SchemaDelta {
        added_children,
        removed_children,
        mut changed_children,
        added_attributes,
        removed_attributes,
        changed_attributes,
        element_order,
        ..
    } = delta;

    apply_attributes(target, added_attributes, changed_attributes, &removed_attributes);
    remove_children(target, &removed_children);

    let existing = target.children.len();
    target.children.extend(added_children);

    if !changed_children.is_empty() {
        for child in &mut target.children[..existing] {
            if let Some(nested) = changed_children.remove(&child.unique_name()) {
                patch_owned(child, nested);
            }
        }
    }

    if let Some(order) = &element_order {
        reorder(target, order);
    }
}

fn apply_attributes(
    target: &mut SchemaNode,
    added: BTreeMap<String, String>,
    changed: BTreeMap<String, String>,
    removed: &BTreeSet<String>,
) {
    target.attributes.extend(added);
    target.attributes.extend(changed);
    for key in removed {
        target.attributes.remove(key);
    }
}

fn remove_children(target: &mut SchemaNode, removed: &[SchemaNode]) {
    if removed.is_empty() {
        return;
    }
    let names: BTreeSet<String> = removed.iter().map(SchemaNode::unique_name).collect();
    target.children.retain(|c| !names.contains(&c.unique_name()));
}

/// Sort children by their recorded index. Validation guarantees the indices
/// form a permutation of the sibling positions.
fn reorder(target: &mut SchemaNode, order: &BTreeMap<String, usize>) {
    target
        .children
        .sort_by_cached_key(|c| order.get(&c.unique_name()).copied().unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::compute_diff;

    fn named(tag: &str, name: &str) -> SchemaNode {
        SchemaNode::new(tag).with_attribute("name", name)
    }

    fn table(children: &[&str]) -> SchemaNode {
        children.iter().fold(named("table", "t"), |t, c| {
            t.with_child(named("column", c))
        })
    }

    fn roundtrip(before: &SchemaNode, after: &SchemaNode) -> SchemaNode {
        let delta = compute_diff(before, after).unwrap().unwrap();
        let mut target = before.clone();
        apply_diff(&mut target, &delta).unwrap();
        target
    }

    fn child_names(node: &SchemaNode) -> Vec<&str> {
        node.children
            .iter()
            .filter_map(|c| c.attribute("name"))
            .collect()
    }

    #[test]
    fn attribute_changes_roundtrip() {
        let a = named("column", "c").with_attribute("x", "1").with_attribute("z", "0");
        let b = named("column", "c").with_attribute("x", "2").with_attribute("y", "3");
        assert_eq!(roundtrip(&a, &b), b);
    }

    #[test]
    fn reorder_only_roundtrip() {
        let a = table(&["p", "q"]);
        let b = table(&["q", "p"]);
        let patched = roundtrip(&a, &b);
        assert_eq!(child_names(&patched), vec!["q", "p"]);
        assert_eq!(patched.min_string(), b.min_string());
    }

    #[test]
    fn add_remove_reorder_roundtrip() {
        let a = table(&["p", "q", "r"]);
        let b = table(&["r", "s", "p"]);
        let patched = roundtrip(&a, &b);
        assert_eq!(child_names(&patched), vec!["r", "s", "p"]);
        assert_eq!(patched, b);
    }

    #[test]
    fn nested_changes_roundtrip() {
        let a = named("databaseschema", "db")
            .with_child(table(&["a", "b"]))
            .with_child(named("table", "u").with_child(named("column", "x")))
            .with_child(SchemaNode::new("check").with_attribute("expr", "1"));
        let mut b = named("databaseschema", "db")
            .with_child(named("table", "v"))
            .with_child(SchemaNode::new("check").with_attribute("expr", "2"))
            .with_child(table(&["b", "c", "a"]));
        b.children[2].children[1].set_attribute("type", "text");
        let patched = roundtrip(&a, &b);
        assert_eq!(patched, b);
        assert!(compute_diff(&patched, &b).unwrap().unwrap().is_unchanged());
    }

    #[test]
    fn emptied_children_roundtrip() {
        let a = table(&["p", "q"]);
        let b = table(&[]);
        assert_eq!(roundtrip(&a, &b), b);
    }

    #[test]
    fn owned_apply_matches_borrowed() {
        let a = table(&["p", "q", "r"]);
        let b = table(&["s", "r"]).with_attribute("engine", "row");
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let mut borrowed = a.clone();
        apply_diff(&mut borrowed, &delta).unwrap();
        let mut owned = a.clone();
        apply_diff_owned(&mut owned, delta).unwrap();
        assert_eq!(owned, borrowed);
        assert_eq!(owned, b);
    }

    #[test]
    fn unchanged_delta_is_noop() {
        let t = table(&["q", "p"]);
        let delta = SchemaDelta::new("tablet");
        let mut target = t.clone();
        apply_diff(&mut target, &delta).unwrap();
        assert_eq!(target, t);
    }

    #[test]
    fn added_subtree_is_independent_of_delta() {
        let a = table(&[]);
        let b = table(&["p"]);
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let mut target = a.clone();
        apply_diff(&mut target, &delta).unwrap();
        target.children[0].set_attribute("type", "int");
        assert_eq!(delta.added_children[0], named("column", "p"));
    }

    #[test]
    fn wrong_target_rejected() {
        let delta = compute_diff(&table(&["p"]), &table(&["q"])).unwrap().unwrap();
        let mut other = named("table", "other");
        let err = apply_diff(&mut other, &delta).unwrap_err();
        assert_eq!(
            err,
            PatchError::TargetMismatch {
                expected: "tablet".into(),
                actual: "tableother".into()
            }
        );
        assert!(err.requires_resync());
    }

    #[test]
    fn missing_removed_child_rejected_without_mutation() {
        let delta = compute_diff(&table(&["p", "q"]), &table(&["q"]).with_attribute("x", "1"))
            .unwrap()
            .unwrap();
        let mut stale = table(&["q"]);
        let snapshot = stale.clone();
        let err = apply_diff(&mut stale, &delta).unwrap_err();
        assert!(matches!(err, PatchError::MissingChild { ref child, .. } if child == "columnp"));
        assert_eq!(stale, snapshot);
    }

    #[test]
    fn missing_changed_child_rejected() {
        let a = table(&["p"]);
        let mut b = table(&["p"]);
        b.children[0].set_attribute("type", "int");
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let mut stale = table(&[]);
        assert!(matches!(
            apply_diff(&mut stale, &delta),
            Err(PatchError::MissingChild { .. })
        ));
    }

    #[test]
    fn nested_failure_leaves_parent_untouched() {
        let a = named("db", "d")
            .with_attribute("v", "1")
            .with_child(table(&["p", "q"]));
        let b = named("db", "d")
            .with_attribute("v", "2")
            .with_child(table(&["q"]));
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let mut stale = named("db", "d")
            .with_attribute("v", "1")
            .with_child(table(&["q"]));
        let snapshot = stale.clone();
        assert!(apply_diff(&mut stale, &delta).is_err());
        assert_eq!(stale, snapshot);
    }

    #[test]
    fn order_count_mismatch_rejected() {
        let a = table(&["p", "q"]);
        let b = table(&["q", "p"]);
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let mut extra = table(&["p", "q", "r"]);
        assert_eq!(
            apply_diff(&mut extra, &delta).unwrap_err(),
            PatchError::OrderCountMismatch {
                parent: "tablet".into(),
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn unordered_child_rejected() {
        let mut delta = SchemaDelta::new("tablet");
        delta.element_order = Some(BTreeMap::from([
            ("columnp".to_string(), 0),
            ("columnz".to_string(), 1),
        ]));
        let mut target = table(&["p", "q"]);
        assert_eq!(
            apply_diff(&mut target, &delta).unwrap_err(),
            PatchError::UnorderedChild {
                parent: "tablet".into(),
                child: "columnq".into()
            }
        );
    }

    #[test]
    fn non_permutation_order_rejected() {
        let mut delta = SchemaDelta::new("tablet");
        delta.element_order = Some(BTreeMap::from([
            ("columnp".to_string(), 1),
            ("columnq".to_string(), 1),
        ]));
        let mut target = table(&["p", "q"]);
        assert!(matches!(
            apply_diff(&mut target, &delta),
            Err(PatchError::InvalidOrderIndex { index: 1, .. })
        ));
    }

    #[test]
    fn duplicate_target_children_rejected() {
        let delta = compute_diff(&table(&["p"]), &table(&["p", "q"]))
            .unwrap()
            .unwrap();
        let mut target = table(&["p", "p"]);
        assert!(matches!(
            apply_diff(&mut target, &delta),
            Err(PatchError::DuplicateTargetChild { .. })
        ));
    }

    #[test]
    fn renaming_nested_delta_rejected() {
        let mut nested = SchemaDelta::new("columnp");
        nested.changed_attributes.insert("name".into(), "z".into());
        nested.element_order = Some(BTreeMap::new());
        let mut delta = SchemaDelta::new("tablet");
        delta.changed_children.insert("columnp".into(), nested);
        let mut target = table(&["p"]);
        assert_eq!(
            apply_diff(&mut target, &delta).unwrap_err(),
            PatchError::UnstableIdentity {
                parent: "tablet".into(),
                child: "columnp".into()
            }
        );
    }

    #[test]
    fn owned_apply_honours_depth_limit() {
        let mut a = named("n", "0");
        let mut b = named("n", "0").with_attribute("x", "1");
        for level in 1..=300 {
            a = named("n", &level.to_string()).with_child(a);
            b = named("n", &level.to_string()).with_child(b);
        }
        let deep = EngineConfig { max_depth: 512 };
        let delta = crate::compute::compute_diff_with(&a, &b, &deep)
            .unwrap()
            .unwrap();

        let mut target = a.clone();
        assert_eq!(
            apply_diff_owned(&mut target, delta.clone()).unwrap_err(),
            PatchError::DepthExceeded { limit: 256 }
        );
        assert_eq!(target, a);

        apply_diff_owned_with(&mut target, delta, &deep).unwrap();
        assert_eq!(target, b);
    }

    #[test]
    fn duplicate_free_levels_roundtrip_beside_duplicates() {
        // Duplicates inside an untouched subtree do not block the diff.
        let colref = SchemaNode::new("colref").with_attribute("column", "a");
        let index = named("index", "i")
            .with_child(colref.clone())
            .with_child(colref);
        let a = table(&["p"]).with_child(index.clone());
        let b = table(&["q"]).with_child(index);
        assert_eq!(roundtrip(&a, &b), b);
    }

    #[test]
    fn validate_diff_does_not_mutate() {
        let a = table(&["p"]);
        let b = table(&["q"]);
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        assert!(validate_diff(&a, &delta).is_ok());
        assert!(validate_diff(&b, &delta).is_err());
    }

    #[test]
    fn depth_limit_enforced() {
        let mut a = named("n", "0");
        let mut b = named("n", "0").with_attribute("x", "1");
        for level in 1..=3 {
            a = named("n", &level.to_string()).with_child(a);
            b = named("n", &level.to_string()).with_child(b);
        }
        let delta = compute_diff(&a, &b).unwrap().unwrap();
        let config = EngineConfig { max_depth: 1 };
        let mut target = a.clone();
        assert_eq!(
            apply_diff_with(&mut target, &delta, &config).unwrap_err(),
            PatchError::DepthExceeded { limit: 1 }
        );
        assert_eq!(target, a);
    }
}
