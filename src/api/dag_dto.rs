use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::dag::{DagContainer, DagGraph, DagLink, DagLinkPort, DagNode, DagPort, LinkMerge, PortType, ScatterMethod};
use crate::domain::utils::id::{NodeId, PortId};
use crate::error::Error;

/// A workflow node as authored in JSON. Nodes with `children` are containers.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DagDto {
    pub id: String,

    #[serde(default)]
    pub inputs: Vec<PortDto>,
    #[serde(default)]
    pub outputs: Vec<PortDto>,

    #[serde(default)]
    pub scatter_method: Option<ScatterMethod>,
    #[serde(default)]
    pub app_hash: Option<String>,

    #[serde(default)]
    pub children: Option<Vec<DagDto>>,
    #[serde(default)]
    pub links: Vec<LinkDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortDto {
    pub id: String,
    #[serde(default)]
    pub scatter: bool,
    #[serde(default)]
    pub link_merge: LinkMerge,
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkDto {
    pub from: LinkEndDto,
    pub to: LinkEndDto,
}

/// A link endpoint. Without `node` the endpoint is the enclosing container's own port.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinkEndDto {
    #[serde(default)]
    pub node: Option<String>,
    pub port: String,
}

impl TryFrom<DagDto> for DagGraph {
    type Error = Error;

    fn try_from(dto: DagDto) -> Result<Self, Self::Error> {
        let mut nodes = HashMap::new();
        let root = flatten_node(dto, None, &mut nodes)?;
        Ok(DagGraph { root, nodes })
    }
}

fn construction_error(message: String) -> Error {
    Error::GraphConstructionError(message)
}

/// Converts one DTO node (and its subtree) into domain nodes and returns the node path.
fn flatten_node(dto: DagDto, parent: Option<&NodeId>, nodes: &mut HashMap<NodeId, DagNode>) -> Result<NodeId, Error> {
    if dto.id.is_empty() || dto.id.contains('.') {
        return Err(construction_error(format!("invalid node id '{}'", dto.id)));
    }
    let node_id = match parent {
        Some(parent) => NodeId::new(format!("{}.{}", parent, dto.id)),
        None => NodeId::new(dto.id.clone()),
    };

    let input_ports = convert_ports(&node_id, dto.inputs, PortType::Input)?;
    let output_ports = convert_ports(&node_id, dto.outputs, PortType::Output)?;

    let container = match dto.children {
        Some(children) => {
            let mut child_ids = Vec::with_capacity(children.len());
            for child in children {
                let child_id = flatten_node(child, Some(&node_id), nodes)?;
                if child_ids.contains(&child_id) {
                    return Err(construction_error(format!("duplicate child node '{}'", child_id)));
                }
                child_ids.push(child_id);
            }

            let mut links = Vec::with_capacity(dto.links.len());
            for link in dto.links {
                let source = resolve_end(&node_id, &input_ports, nodes, link.from, PortType::Input, PortType::Output)?;
                let destination = resolve_end(&node_id, &output_ports, nodes, link.to, PortType::Output, PortType::Input)?;
                links.push(DagLink { source, destination });
            }
            Some(DagContainer { children: child_ids, links })
        }
        None if !dto.links.is_empty() => {
            return Err(construction_error(format!("node '{}' declares links but no children", node_id)));
        }
        None => None,
    };

    if dto.scatter_method.is_some() && !input_ports.iter().any(|p| p.scatter) {
        log::warn!("Node {} declares a scatter method but no scatter port.", node_id);
    }

    nodes.insert(
        node_id.clone(),
        DagNode { id: node_id.clone(), input_ports, output_ports, scatter_method: dto.scatter_method, app_hash: dto.app_hash, container },
    );
    Ok(node_id)
}

fn convert_ports(node_id: &NodeId, ports: Vec<PortDto>, port_type: PortType) -> Result<Vec<DagPort>, Error> {
    let mut seen = HashSet::new();
    let mut converted = Vec::with_capacity(ports.len());
    for port in ports {
        if !seen.insert(port.id.clone()) {
            return Err(construction_error(format!("duplicate {} port '{}' on node '{}'", port_type, port.id, node_id)));
        }
        if port.scatter && port_type == PortType::Output {
            return Err(construction_error(format!("output port '{}' on node '{}' cannot scatter", port.id, node_id)));
        }
        converted.push(DagPort {
            id: PortId::new(port.id),
            port_type,
            scatter: port.scatter,
            link_merge: port.link_merge,
            default: port.default,
        });
    }
    Ok(converted)
}

/// Resolves a link endpoint inside container `container_id`.
///
/// An endpoint on the container itself uses `own_type` ports, an endpoint on a
/// child uses `child_type` ports.
fn resolve_end(
    container_id: &NodeId,
    own_ports: &[DagPort],
    nodes: &HashMap<NodeId, DagNode>,
    end: LinkEndDto,
    own_type: PortType,
    child_type: PortType,
) -> Result<DagLinkPort, Error> {
    let port_id = PortId::new(end.port);
    match end.node {
        None => {
            if !own_ports.iter().any(|p| p.id == port_id) {
                return Err(construction_error(format!("container '{}' has no {} port '{}'", container_id, own_type, port_id)));
            }
            Ok(DagLinkPort { node_id: container_id.clone(), port_id, port_type: own_type })
        }
        Some(child) => {
            let node_id = NodeId::new(format!("{}.{}", container_id, child));
            let node = nodes
                .get(&node_id)
                .ok_or_else(|| construction_error(format!("link references unknown node '{}' in '{}'", child, container_id)))?;
            if node.port(&port_id, child_type).is_none() {
                return Err(construction_error(format!("node '{}' has no {} port '{}'", node_id, child_type, port_id)));
            }
            Ok(DagLinkPort { node_id, port_id, port_type: child_type })
        }
    }
}
