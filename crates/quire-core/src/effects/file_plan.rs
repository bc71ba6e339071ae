//! File plan effects

use crate::{NodeRef, NodeState, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Stored properties of a node, keyed by qualified property name
pub type NodeProperties = BTreeMap<String, serde_json::Value>;

/// Effect trait for reading records-management node state
#[async_trait]
pub trait FilePlanEffects: Send + Sync {
    /// Snapshot the records-management state of a node
    ///
    /// Returns `NotFound` when the node does not exist. Nodes outside any file
    /// plan yield a state with `kind == None`.
    async fn node_state(&self, node: &NodeRef) -> Result<NodeState>;

    /// Current property values of a node
    async fn node_properties(&self, node: &NodeRef) -> Result<NodeProperties>;
}
