use std::{fmt::Display, str::FromStr};

use serde_json::Value;

use crate::{MergeError, MergeResult};

/// Dot-delimited address of a connection inside a response object,
/// e.g. `viewer.wallet.transactions`.
///
/// The empty path addresses the response root.
/// Segments that parse as integers also index into arrays.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ConnectionPath {
    raw: String,
    segments: Vec<String>,
}

impl ConnectionPath {
    pub fn parse(raw: &str) -> MergeResult<Self> {
        let segments = if raw.is_empty() {
            vec![]
        } else {
            raw.split('.')
                .map(|segment| {
                    if segment.is_empty() {
                        Err(MergeError::InvalidPath(raw.to_string()))
                    } else {
                        Ok(segment.to_string())
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn root() -> Self {
        Self {
            raw: String::new(),
            segments: vec![],
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> + use<'_> {
        self.segments.iter().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.segments()
            .try_fold(value, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(array) => segment.parse::<usize>().ok().and_then(|i| array.get(i)),
                _ => None,
            })
    }

    pub fn resolve_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        self.segments()
            .try_fold(value, |value, segment| match value {
                Value::Object(map) => map.get_mut(segment),
                Value::Array(array) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| array.get_mut(i)),
                _ => None,
            })
    }
}

impl FromStr for ConnectionPath {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ConnectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
