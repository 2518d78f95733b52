use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::utils::id::{NodeId, PortId};

/// Direction of a port, seen from the node that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortType {
    Input,
    Output,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::Input => write!(f, "INPUT"),
            PortType::Output => write!(f, "OUTPUT"),
        }
    }
}

/// How several deliveries into one input port are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMerge {
    /// Blocking: the port waits for one delivery per incoming link and keeps them
    /// as an ordered sequence.
    #[default]
    MergeNested,
    /// Non-blocking: any delivery satisfies the port, later ones are flattened in.
    MergeFlattened,
}

impl LinkMerge {
    pub fn is_blocking(self) -> bool {
        matches!(self, LinkMerge::MergeNested)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScatterMethod {
    DotProduct,
    FlatCrossProduct,
    NestedCrossProduct,
}

impl std::fmt::Display for ScatterMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScatterMethod::DotProduct => write!(f, "dotproduct"),
            ScatterMethod::FlatCrossProduct => write!(f, "flat_crossproduct"),
            ScatterMethod::NestedCrossProduct => write!(f, "nested_crossproduct"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagPort {
    pub id: PortId,
    pub port_type: PortType,
    pub scatter: bool,
    pub link_merge: LinkMerge,
    pub default: Option<Value>,
}

/// One end of a static link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagLinkPort {
    pub node_id: NodeId,
    pub port_id: PortId,
    pub port_type: PortType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagLink {
    pub source: DagLinkPort,
    pub destination: DagLinkPort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagContainer {
    /// Keys into `DagGraph.nodes`, in declaration order.
    pub children: Vec<NodeId>,
    pub links: Vec<DagLink>,
}

/// Immutable description of one node of the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagNode {
    /// Dotted path from the graph root, e.g. `main.align`.
    pub id: NodeId,
    pub input_ports: Vec<DagPort>,
    pub output_ports: Vec<DagPort>,
    pub scatter_method: Option<ScatterMethod>,
    pub app_hash: Option<String>,
    pub container: Option<DagContainer>,
}

impl DagNode {
    /// Last segment of the node path, used to name the job instantiated for it.
    pub fn local_name(&self) -> &str {
        self.id.local_name()
    }

    pub fn is_container(&self) -> bool {
        self.container.is_some()
    }

    pub fn ports(&self, port_type: PortType) -> &[DagPort] {
        match port_type {
            PortType::Input => &self.input_ports,
            PortType::Output => &self.output_ports,
        }
    }

    pub fn port(&self, port_id: &PortId, port_type: PortType) -> Option<&DagPort> {
        self.ports(port_type).iter().find(|p| &p.id == port_id)
    }

    pub fn input_port(&self, port_id: &PortId) -> Option<&DagPort> {
        self.port(port_id, PortType::Input)
    }

    /// Scatter ports in declaration order.
    pub fn scatter_ports(&self) -> Vec<PortId> {
        self.input_ports.iter().filter(|p| p.scatter).map(|p| p.id.clone()).collect()
    }

    pub fn is_scatter_port(&self, port_id: &PortId) -> bool {
        self.input_port(port_id).map(|p| p.scatter).unwrap_or(false)
    }

    pub fn link_merge(&self, port_id: &PortId) -> LinkMerge {
        self.input_port(port_id).map(|p| p.link_merge).unwrap_or_default()
    }
}
