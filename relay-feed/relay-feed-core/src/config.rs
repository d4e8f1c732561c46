use serde::{Deserialize, Serialize};

use crate::{NodeKey, patch::InsertPolicy};

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// Number of edges requested per page (`first`).
    pub default_page_size: usize,
    pub node_key: NodeKey,
    /// Placement of nodes that arrive through subscriptions and are not yet in the feed.
    pub insert_policy: InsertPolicy,
    /// Capacity of the event bus channel.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            node_key: NodeKey::default(),
            insert_policy: InsertPolicy::default(),
            event_capacity: 64,
        }
    }
}
