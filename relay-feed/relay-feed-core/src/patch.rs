//! Single-item updates of an accumulated connection.
//!
//! These never merge pages. They locate edges by node key and produce
//! a new response value, leaving the input untouched.

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    ConnectionPath, MergeResult, NodeKey,
    connection::{NODE, connection_at_mut, edges_mut, shape_mismatch},
    node_key::KeyRepr,
};

/// Where a node that is not yet part of the feed gets inserted.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum InsertPolicy {
    /// Newest first, e.g. a freshly posted comment on top of the responses.
    Prepend,
    #[default]
    Append,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Upserted {
    /// An edge with the same node key existed; its node was replaced and its cursor kept.
    Replaced,
    /// No edge had the node key; the edge was inserted.
    Inserted,
}

/// Replace the node of the edge with the same node key as `node`.
///
/// Returns `None` when no such edge exists.
pub fn replace_node(
    response: &Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
    node: Value,
) -> MergeResult<Option<Value>> {
    let Some(key) = node_key.identify(&node) else {
        return Ok(None);
    };

    let mut response = response.clone();
    let edges = edges_mut(connection_at_mut(&mut response, path)?, path)?;

    let Some(position) = find_edge(edges, node_key, &key) else {
        return Ok(None);
    };
    edges[position][NODE] = node;

    debug!(%path, position, "replaced node");
    Ok(Some(response))
}

/// Replace the node of an existing edge, or insert `edge` if its node is new.
pub fn upsert_edge(
    response: &Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
    edge: Value,
    policy: InsertPolicy,
) -> MergeResult<(Value, Upserted)> {
    let Some(node) = edge.get(NODE) else {
        return Err(shape_mismatch(path, "upserted edge has no `node`"));
    };

    if let Some(replaced) = replace_node(response, path, node_key, node.clone())? {
        return Ok((replaced, Upserted::Replaced));
    }

    let mut response = response.clone();
    let edges = edges_mut(connection_at_mut(&mut response, path)?, path)?;
    match policy {
        InsertPolicy::Prepend => edges.insert(0, edge),
        InsertPolicy::Append => edges.push(edge),
    }

    debug!(%path, ?policy, "inserted edge");
    Ok((response, Upserted::Inserted))
}

/// Remove every edge whose node key is one of `keys`.
///
/// The keys are raw key values, e.g. the ids when nodes are keyed by `id`.
/// Returns the new response and the number of removed edges.
pub fn remove_nodes(
    response: &Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
    keys: &[Value],
) -> MergeResult<(Value, usize)> {
    let doomed: FnvHashSet<KeyRepr> = keys.iter().map(KeyRepr::of).collect();

    let mut response = response.clone();
    let edges = edges_mut(connection_at_mut(&mut response, path)?, path)?;
    let before = edges.len();
    edges.retain(|edge| {
        node_key
            .identify_edge(edge)
            .is_none_or(|key| !doomed.contains(&key))
    });
    let removed = before - edges.len();

    debug!(%path, removed, "removed nodes");
    Ok((response, removed))
}

/// Keep only the edges whose node satisfies `predicate`.
pub fn retain_nodes(
    response: &Value,
    path: &ConnectionPath,
    mut predicate: impl FnMut(&Value) -> bool,
) -> MergeResult<Value> {
    let mut response = response.clone();
    let edges = edges_mut(connection_at_mut(&mut response, path)?, path)?;
    edges.retain(|edge| edge.get(NODE).is_some_and(&mut predicate));

    Ok(response)
}

/// Recursively merge `patch` into `target`.
///
/// Objects are merged field by field and arrays element by element.
/// For any other combination the value from `patch` wins.
/// This is how an edited node pushed by a subscription is folded
/// into the previous response.
pub fn deep_merge(target: Value, patch: Value) -> Value {
    match (target, patch) {
        (Value::Object(mut target), Value::Object(patch)) => {
            for (field, patch_value) in patch {
                match target.get_mut(&field) {
                    Some(slot) => {
                        let target_value = slot.take();
                        *slot = deep_merge(target_value, patch_value);
                    }
                    None => {
                        target.insert(field, patch_value);
                    }
                }
            }
            Value::Object(target)
        }
        (Value::Array(target), Value::Array(patch)) => {
            let mut target = target.into_iter();
            let mut merged: Vec<Value> = patch
                .into_iter()
                .map(|patch_value| match target.next() {
                    Some(target_value) => deep_merge(target_value, patch_value),
                    None => patch_value,
                })
                .collect();
            merged.extend(target);
            Value::Array(merged)
        }
        (_, patch) => patch,
    }
}

fn find_edge(edges: &[Value], node_key: &NodeKey, key: &KeyRepr) -> Option<usize> {
    edges
        .iter()
        .position(|edge| node_key.identify_edge(edge).as_ref() == Some(key))
}
