use thiserror::Error;

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum MergeError {
    #[error("Path `{path}` does not resolve to an object")]
    PathNotFound { path: String },
    #[error("Value at `{path}` is not a connection: {reason}")]
    ShapeMismatch { path: String, reason: String },
    #[error("Invalid connection path `{0}`")]
    InvalidPath(String),
}

pub type MergeResult<T> = Result<T, MergeError>;
