use serde_json::Value;

/// Node ids of the connection at the dotted `path`, in edge order.
pub fn edge_ids(response: &Value, path: &str) -> Vec<String> {
    edges_at(response, path)
        .iter()
        .map(|edge| match &edge["node"]["id"] {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Edge cursors of the connection at the dotted `path`, in edge order.
pub fn edge_cursors(response: &Value, path: &str) -> Vec<String> {
    edges_at(response, path)
        .iter()
        .map(|edge| edge["cursor"].as_str().unwrap().to_string())
        .collect()
}

pub fn json_at<'v>(value: &'v Value, path: &str) -> &'v Value {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .fold(value, |value, segment| match value {
            Value::Array(array) => &array[segment.parse::<usize>().unwrap()],
            _ => &value[segment],
        })
}

fn edges_at<'v>(response: &'v Value, path: &str) -> &'v [Value] {
    let Value::Array(edges) = &json_at(response, path)["edges"] else {
        panic!("No edges at `{path}`");
    };
    edges
}
