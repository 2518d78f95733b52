use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::dag::dag_node::DagNode;
use crate::domain::utils::id::{ContextId, NodeId};
use crate::error::{Error, Result};

/// A whole workflow graph, flattened into a node table keyed by node path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagGraph {
    pub root: NodeId,
    pub nodes: HashMap<NodeId, DagNode>,
}

impl DagGraph {
    pub fn root_node(&self) -> Option<&DagNode> {
        self.nodes.get(&self.root)
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&DagNode> {
        self.nodes.get(node_id)
    }
}

/// Static graph lookup, one immutable graph per context.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: HashMap<ContextId, Arc<DagGraph>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the graph of a run. A graph already registered for the context is kept.
    pub fn register(&mut self, context_id: ContextId, graph: DagGraph) -> Arc<DagGraph> {
        self.graphs.entry(context_id).or_insert_with(|| Arc::new(graph)).clone()
    }

    pub fn graph(&self, context_id: &ContextId) -> Result<Arc<DagGraph>> {
        self.graphs.get(context_id).cloned().ok_or_else(|| Error::ContextNotFound(context_id.to_string()))
    }

    /// Looks up a node together with the graph that owns it.
    pub fn node(&self, context_id: &ContextId, node_id: &NodeId) -> Result<(Arc<DagGraph>, DagNode)> {
        let graph = self.graph(context_id)?;
        let node = graph
            .node(node_id)
            .cloned()
            .ok_or_else(|| Error::NodeNotFound { context_id: context_id.to_string(), node_id: node_id.to_string() })?;
        Ok((graph, node))
    }
}
