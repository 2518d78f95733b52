use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::api::dag_dto::DagDto;
use crate::domain::dag::DagGraph;
use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_json::from_str(&data)?;
    Ok(parsed_data)
}

/// Loads a workflow definition and flattens it into a graph.
pub fn load_dag(file_path: impl AsRef<Path>) -> Result<DagGraph> {
    let file_path = file_path.as_ref();
    let dto: DagDto = parse_json_file(file_path)?;
    let graph = DagGraph::try_from(dto)?;
    log::info!("Loaded workflow {} with {} nodes from '{}'.", graph.root, graph.nodes.len(), file_path.display());
    Ok(graph)
}
