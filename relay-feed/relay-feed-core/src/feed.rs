use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    Config, ConnectionPath, MergeError, NodeKey, Optimistic, PageInfo,
    connection::{connection_at, edges},
    event::{ArcEventSink, FeedEvent},
    merge_connections,
    patch::{self, InsertPolicy, Upserted},
};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("A fetch is already in flight")]
    FetchInFlight,
    #[error("Feed has no loaded page")]
    NotLoaded,
    #[error("Feed has no next page")]
    Exhausted,
    #[error("Stale response from fetch #{ticket}, current fetch is #{current}")]
    StaleResponse { ticket: u64, current: u64 },
    #[error(transparent)]
    Merge(#[from] MergeError),
}

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FeedStatus {
    Empty,
    Loading,
    Loaded,
    LoadingMore,
    Exhausted,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FetchKind {
    Initial,
    More,
}

/// Token for one issued fetch. The response must be handed back together with it.
#[derive(Clone, PartialEq, Debug)]
pub struct FetchTicket {
    generation: u64,
    kind: FetchKind,
    variables: Value,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    /// Query variables to send, including `first` and, for load-more, `after`.
    pub fn variables(&self) -> &Value {
        &self.variables
    }
}

/// The accumulated state of one paginated view.
///
/// Only one fetch may be in flight at a time. Every fetch is stamped with a
/// generation, and responses whose generation is no longer current (because
/// the variables changed or the feed was reset meanwhile) are discarded.
pub struct Feed {
    name: String,
    path: ConnectionPath,
    node_key: NodeKey,
    page_size: usize,
    insert_policy: InsertPolicy,
    variables: Value,
    data: Option<Value>,
    status: FeedStatus,
    generation: u64,
    events: Option<ArcEventSink>,
}

impl Feed {
    pub fn new(name: impl Into<String>, path: ConnectionPath) -> Self {
        Self::from_config(name, path, &Config::default())
    }

    pub fn from_config(name: impl Into<String>, path: ConnectionPath, config: &Config) -> Self {
        Self {
            name: name.into(),
            path,
            node_key: config.node_key.clone(),
            page_size: config.default_page_size,
            insert_policy: config.insert_policy,
            variables: Value::Object(Map::new()),
            data: None,
            status: FeedStatus::Empty,
            generation: 0,
            events: None,
        }
    }

    pub fn with_events(self, events: ArcEventSink) -> Self {
        Self {
            events: Some(events),
            ..self
        }
    }

    pub fn with_page_size(self, page_size: usize) -> Self {
        Self { page_size, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &ConnectionPath {
        &self.path
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    /// The accumulated response, if any page has been loaded.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn edges(&self) -> &[Value] {
        self.data
            .as_ref()
            .and_then(|data| connection_at(data, &self.path).ok())
            .map(edges)
            .unwrap_or_default()
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.data
            .as_ref()
            .and_then(|data| PageInfo::from_response(data, &self.path).ok())
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.status, FeedStatus::Loading | FeedStatus::LoadingMore)
    }

    /// Issue a first-page fetch.
    ///
    /// Changed variables discard the accumulated connection. Any fetch
    /// still in flight becomes stale.
    pub fn fetch(&mut self, variables: Value) -> FetchTicket {
        if variables != self.variables {
            debug!(feed = %self.name, "variables changed, restarting from empty");
            self.data = None;
            self.variables = variables;
        }

        self.generation += 1;
        self.status = FeedStatus::Loading;

        FetchTicket {
            generation: self.generation,
            kind: FetchKind::Initial,
            variables: self.page_variables(None),
        }
    }

    /// Issue a fetch of the page following the accumulated edges.
    pub fn load_more(&mut self) -> FeedResult<FetchTicket> {
        match self.status {
            FeedStatus::Loading | FeedStatus::LoadingMore => return Err(FeedError::FetchInFlight),
            FeedStatus::Empty => return Err(FeedError::NotLoaded),
            FeedStatus::Exhausted => return Err(FeedError::Exhausted),
            FeedStatus::Loaded => {}
        }

        let end_cursor = self.page_info().and_then(|page_info| page_info.end_cursor);
        let location = self.edges().len();

        self.generation += 1;
        self.status = FeedStatus::LoadingMore;

        if let Some(events) = &self.events {
            events.emit(FeedEvent::track(
                "load_more",
                [("type", json!(self.name)), ("location", json!(location))],
            ));
        }

        Ok(FetchTicket {
            generation: self.generation,
            kind: FetchKind::More,
            variables: self.page_variables(end_cursor),
        })
    }

    /// Hand back the response of a fetch and get the accumulated response.
    pub fn complete(&mut self, ticket: FetchTicket, response: Value) -> FeedResult<&Value> {
        self.check_current(&ticket)?;

        let old = match ticket.kind {
            FetchKind::Initial => None,
            FetchKind::More => self.data.as_ref(),
        };

        let merged = merge_connections(old, response, &self.path, &self.node_key)
            .and_then(|merged| {
                let page_info = PageInfo::from_response(&merged, &self.path)?;
                Ok((merged, page_info))
            });

        match merged {
            Ok((merged, page_info)) => {
                self.status = if page_info.has_next_page {
                    FeedStatus::Loaded
                } else {
                    FeedStatus::Exhausted
                };
                Ok(self.data.insert(merged))
            }
            Err(error) => {
                self.restore_status();
                Err(error.into())
            }
        }
    }

    /// Report that a fetch failed. The feed returns to its state before the fetch.
    pub fn fail(&mut self, ticket: FetchTicket) -> FeedResult<()> {
        self.check_current(&ticket)?;
        self.restore_status();
        Ok(())
    }

    /// Forget everything, e.g. when the view goes away. In-flight fetches become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.data = None;
        self.status = FeedStatus::Empty;
    }

    /// Apply a single-edge update, e.g. a newly posted item pushed by a subscription.
    pub fn upsert(&mut self, edge: Value) -> FeedResult<Upserted> {
        let data = self.data.as_ref().ok_or(FeedError::NotLoaded)?;
        let (data, upserted) =
            patch::upsert_edge(data, &self.path, &self.node_key, edge, self.insert_policy)?;
        self.data = Some(data);
        Ok(upserted)
    }

    /// Remove nodes by key value. Returns the number of removed edges.
    pub fn remove(&mut self, keys: &[Value]) -> FeedResult<usize> {
        let data = self.data.as_ref().ok_or(FeedError::NotLoaded)?;
        let (data, removed) = patch::remove_nodes(data, &self.path, &self.node_key, keys)?;
        self.data = Some(data);
        Ok(removed)
    }

    /// Fold a partial response pushed by a subscription into the accumulated response.
    ///
    /// A patch that leaves no valid connection at the feed's path is rejected
    /// and the accumulated response is kept as it was.
    pub fn apply_subscription(&mut self, patch: Value) -> FeedResult<&Value> {
        let data = self.data.as_ref().ok_or(FeedError::NotLoaded)?;
        let merged = patch::deep_merge(data.clone(), patch);
        if let Err(error) = connection_at(&merged, &self.path) {
            warn!(feed = %self.name, %error, "rejecting subscription patch");
            return Err(error.into());
        }
        Ok(self.data.insert(merged))
    }

    /// Show the current value of an optimistic node.
    ///
    /// Returns `false` if the node is not part of the feed.
    pub fn reconcile(&mut self, optimistic: &Optimistic<Value>) -> FeedResult<bool> {
        let data = self.data.as_ref().ok_or(FeedError::NotLoaded)?;
        match patch::replace_node(data, &self.path, &self.node_key, optimistic.value().clone())? {
            Some(data) => {
                self.data = Some(data);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn check_current(&self, ticket: &FetchTicket) -> FeedResult<()> {
        if ticket.generation != self.generation || !self.is_fetching() {
            warn!(
                feed = %self.name,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            return Err(FeedError::StaleResponse {
                ticket: ticket.generation,
                current: self.generation,
            });
        }
        Ok(())
    }

    fn restore_status(&mut self) {
        self.status = match &self.data {
            None => FeedStatus::Empty,
            Some(_) => match self.page_info() {
                Some(PageInfo {
                    has_next_page: false,
                    ..
                }) => FeedStatus::Exhausted,
                _ => FeedStatus::Loaded,
            },
        };
    }

    fn page_variables(&self, after: Option<String>) -> Value {
        let mut variables = match &self.variables {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        variables.insert("first".to_string(), json!(self.page_size));
        if let Some(after) = after {
            variables.insert("after".to_string(), Value::String(after));
        }
        Value::Object(variables)
    }
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("edges", &self.edges().len())
            .finish()
    }
}
