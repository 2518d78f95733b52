pub mod dag_graph;
pub mod dag_node;

pub use dag_graph::{DagGraph, GraphStore};
pub use dag_node::{DagContainer, DagLink, DagLinkPort, DagNode, DagPort, LinkMerge, PortType, ScatterMethod};
