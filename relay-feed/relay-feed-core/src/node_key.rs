use std::fmt::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How nodes are identified across pages.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum NodeKey {
    /// The node is identified by the value of one of its fields.
    Field(String),
    /// The node is identified by its entire value.
    Whole,
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::Field("id".to_string())
    }
}

impl NodeKey {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Compute the identity of a node.
    ///
    /// Returns `None` if the node has no identity, i.e. it lacks the key field
    /// or the field is `null`. Such nodes never count as duplicates.
    pub fn identify(&self, node: &Value) -> Option<KeyRepr> {
        match self {
            Self::Field(field) => node
                .get(field)
                .filter(|value| !value.is_null())
                .map(KeyRepr::of),
            Self::Whole => Some(KeyRepr::of(node)),
        }
    }

    /// Compute the identity of the node inside an edge object.
    pub fn identify_edge(&self, edge: &Value) -> Option<KeyRepr> {
        edge.get("node").and_then(|node| self.identify(node))
    }
}

/// Hashable, canonical representation of a JSON value used as a node identity.
///
/// Object keys are sorted, so two objects with equal content but different
/// field order have the same representation.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct KeyRepr(String);

impl KeyRepr {
    pub fn of(value: &Value) -> Self {
        let mut buf = String::new();
        write_canonical(value, &mut buf);
        Self(buf)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn write_canonical(value: &Value, buf: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            buf.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                let _ = write!(buf, "{}:", Value::String(key.clone()));
                write_canonical(value, buf);
            }
            buf.push('}');
        }
        Value::Array(array) => {
            buf.push('[');
            for (i, value) in array.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                write_canonical(value, buf);
            }
            buf.push(']');
        }
        scalar => {
            let _ = write!(buf, "{scalar}");
        }
    }
}
