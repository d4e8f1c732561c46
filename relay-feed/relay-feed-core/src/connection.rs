use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{ConnectionPath, MergeError, MergeResult};

pub const EDGES: &str = "edges";
pub const PAGE_INFO: &str = "pageInfo";
pub const NODE: &str = "node";
pub const CURSOR: &str = "cursor";

/// Typed form of a Relay connection.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_previous_page: Option<bool>,
}

impl<T: DeserializeOwned> Connection<T> {
    /// Read the connection at `path` of a response into typed form.
    pub fn from_response(response: &Value, path: &ConnectionPath) -> MergeResult<Self> {
        let connection = connection_at(response, path)?;
        serde_json::from_value(Value::Object(connection.clone()))
            .map_err(|err| shape_mismatch(path, err.to_string()))
    }
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

impl PageInfo {
    pub fn from_response(response: &Value, path: &ConnectionPath) -> MergeResult<Self> {
        let connection = connection_at(response, path)?;
        serde_json::from_value(connection[PAGE_INFO].clone())
            .map_err(|err| shape_mismatch(path, err.to_string()))
    }
}

/// Resolve a connection-shaped object at `path`.
pub(crate) fn connection_at<'v>(
    response: &'v Value,
    path: &ConnectionPath,
) -> MergeResult<&'v Map<String, Value>> {
    match path.resolve(response) {
        Some(Value::Object(connection)) => {
            check_shape(connection, path)?;
            Ok(connection)
        }
        _ => Err(path_not_found(path)),
    }
}

pub(crate) fn connection_at_mut<'v>(
    response: &'v mut Value,
    path: &ConnectionPath,
) -> MergeResult<&'v mut Map<String, Value>> {
    match path.resolve_mut(response) {
        Some(Value::Object(connection)) => {
            check_shape(connection, path)?;
            Ok(connection)
        }
        _ => Err(path_not_found(path)),
    }
}

/// Edges of a connection that already passed [connection_at].
pub(crate) fn edges(connection: &Map<String, Value>) -> &[Value] {
    match connection.get(EDGES) {
        Some(Value::Array(edges)) => edges.as_slice(),
        _ => &[],
    }
}

pub(crate) fn edges_mut<'c>(
    connection: &'c mut Map<String, Value>,
    path: &ConnectionPath,
) -> MergeResult<&'c mut Vec<Value>> {
    connection
        .get_mut(EDGES)
        .and_then(Value::as_array_mut)
        .ok_or_else(|| shape_mismatch(path, "`edges` is not an array"))
}

fn check_shape(connection: &Map<String, Value>, path: &ConnectionPath) -> MergeResult<()> {
    let Some(edges) = connection.get(EDGES) else {
        return Err(shape_mismatch(path, "missing `edges`"));
    };
    let Value::Array(edges) = edges else {
        return Err(shape_mismatch(path, "`edges` is not an array"));
    };
    if edges.iter().any(|edge| !edge.is_object()) {
        return Err(shape_mismatch(path, "edge is not an object"));
    }
    match connection.get(PAGE_INFO) {
        Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(shape_mismatch(path, "`pageInfo` is not an object")),
        None => Err(shape_mismatch(path, "missing `pageInfo`")),
    }
}

pub(crate) fn path_not_found(path: &ConnectionPath) -> MergeError {
    MergeError::PathNotFound {
        path: path.to_string(),
    }
}

pub(crate) fn shape_mismatch(path: &ConnectionPath, reason: impl Into<String>) -> MergeError {
    MergeError::ShapeMismatch {
        path: path.to_string(),
        reason: reason.into(),
    }
}
