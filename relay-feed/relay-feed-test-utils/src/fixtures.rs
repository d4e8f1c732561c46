use serde_json::{Value, json};

/// Edge whose node is `{ "id": id }`.
pub fn edge(cursor: &str, id: &str) -> Value {
    json!({ "cursor": cursor, "node": { "id": id } })
}

/// Connection with one edge per id. Each edge's cursor is `cursor-<id>`.
pub fn connection(ids: &[&str], has_next_page: bool) -> Value {
    let edges: Vec<Value> = ids
        .iter()
        .map(|id| edge(&format!("cursor-{id}"), id))
        .collect();

    let mut page_info = json!({ "hasNextPage": has_next_page });
    if let (Some(first), Some(last)) = (ids.first(), ids.last()) {
        page_info["startCursor"] = json!(format!("cursor-{first}"));
        page_info["endCursor"] = json!(format!("cursor-{last}"));
    }

    json!({ "edges": edges, "pageInfo": page_info })
}

/// Nest `value` inside objects along the dotted `path`.
pub fn nest_at(path: &str, value: Value) -> Value {
    path.rsplit('.')
        .filter(|segment| !segment.is_empty())
        .fold(value, |inner, segment| json!({ segment: inner }))
}

/// A response holding a connection of the given ids at `path`.
pub fn response_at(path: &str, ids: &[&str], has_next_page: bool) -> Value {
    nest_at(path, connection(ids, has_next_page))
}
