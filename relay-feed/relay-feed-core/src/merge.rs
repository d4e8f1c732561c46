use fnv::FnvHashSet;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    ConnectionPath, MergeResult, NodeKey,
    connection::{EDGES, PAGE_INFO, connection_at, connection_at_mut, edges, edges_mut},
    node_key::KeyRepr,
};

#[derive(Clone, Copy, Debug)]
enum Direction {
    /// `first`/`after` pagination: the new page follows the accumulated edges.
    Forward,
    /// `last`/`before` pagination: the new page precedes the accumulated edges.
    Backward,
}

/// Merge a newly fetched page into the previously accumulated response.
///
/// The result is `new` with the connection at `path` holding the edges of `old`
/// followed by the edges of `new` whose node key was not already present.
/// Everything else, including `pageInfo`, comes from `new`.
///
/// When `old` is `None`, or holds `null` at `path`, `new` is returned unchanged.
/// `new` must always contain a connection at `path`.
pub fn merge_connections(
    old: Option<&Value>,
    new: Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
) -> MergeResult<Value> {
    merge(old, new, path, node_key, Direction::Forward)
}

/// Like [merge_connections], but for backward pagination.
///
/// New edges are placed before the accumulated edges.
/// The merged `pageInfo` keeps the forward end (`endCursor`, `hasNextPage`)
/// of the old page info and takes the backward end from the new one.
pub fn merge_connections_backward(
    old: Option<&Value>,
    new: Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
) -> MergeResult<Value> {
    merge(old, new, path, node_key, Direction::Backward)
}

fn merge(
    old: Option<&Value>,
    mut new: Value,
    path: &ConnectionPath,
    node_key: &NodeKey,
    direction: Direction,
) -> MergeResult<Value> {
    connection_at(&new, path)?;

    let Some(old) = old else {
        debug!(%path, "first page, nothing to merge");
        return Ok(new);
    };
    if let Some(Value::Null) = path.resolve(old) {
        debug!(%path, "previous connection is null, nothing to merge");
        return Ok(new);
    }

    let old_connection = connection_at(old, path)?;
    let old_edges = edges(old_connection);

    let mut seen: FnvHashSet<KeyRepr> = old_edges
        .iter()
        .filter_map(|edge| node_key.identify_edge(edge))
        .collect();

    let new_connection = connection_at_mut(&mut new, path)?;
    let new_edges = std::mem::take(edges_mut(new_connection, path)?);
    let new_len = new_edges.len();

    let fresh: Vec<Value> = new_edges
        .into_iter()
        .filter(|edge| match node_key.identify_edge(edge) {
            Some(key) => seen.insert(key),
            None => true,
        })
        .collect();

    if fresh.len() < new_len {
        trace!(
            %path,
            dropped = new_len - fresh.len(),
            "dropped edges already present in accumulated connection"
        );
    }

    let merged: Vec<Value> = match direction {
        Direction::Forward => old_edges.iter().cloned().chain(fresh).collect(),
        Direction::Backward => {
            let page_info = backward_page_info(old_connection, new_connection);
            new_connection.insert(PAGE_INFO.to_string(), Value::Object(page_info));

            fresh.into_iter().chain(old_edges.iter().cloned()).collect()
        }
    };

    debug!(%path, edges = merged.len(), "merged connection");
    new_connection.insert(EDGES.to_string(), Value::Array(merged));

    Ok(new)
}

fn backward_page_info(old: &Map<String, Value>, new: &Map<String, Value>) -> Map<String, Value> {
    let mut page_info = new
        .get(PAGE_INFO)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let old_page_info = old.get(PAGE_INFO).and_then(Value::as_object);

    for field in ["endCursor", "hasNextPage"] {
        match old_page_info.and_then(|old| old.get(field)) {
            Some(value) => {
                page_info.insert(field.to_string(), value.clone());
            }
            None => {
                page_info.remove(field);
            }
        }
    }

    page_info
}
