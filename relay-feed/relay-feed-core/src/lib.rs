#![forbid(unsafe_code)]

//! Accumulation of cursor-paginated GraphQL connections on the client side.
//!
//! A view fetches pages of a Relay-style connection and passes each new
//! response through [merge_connections] to get the accumulated response it renders.
//! Single-item updates (optimistic mutation responses, subscription pushes)
//! are applied with the functions in [patch], using the same node identity rules.

pub mod config;
pub mod connection;
pub mod event;
pub mod feed;
pub mod merge_error;
pub mod node_key;
pub mod optimistic;
pub mod patch;
pub mod path;
pub mod query_builder;

mod merge;

pub use config::Config;
pub use connection::{Connection, Edge, PageInfo};
pub use feed::{Feed, FeedError, FeedResult, FeedStatus, FetchTicket};
pub use merge::{merge_connections, merge_connections_backward};
pub use merge_error::{MergeError, MergeResult};
pub use node_key::NodeKey;
pub use optimistic::Optimistic;
pub use path::ConnectionPath;
