use thiserror::Error;

use crate::domain::scatter::ScatterError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to build workflow graph: {0}")]
    GraphConstructionError(String),

    #[error("Context {0} not found")]
    ContextNotFound(String),

    #[error("Job {job_id} not found in context {context_id}")]
    JobNotFound { context_id: String, job_id: String },

    #[error("Variable {job_id}.{port_id} ({port_type}) not found in context {context_id}")]
    VariableNotFound { context_id: String, job_id: String, port_id: String, port_type: String },

    #[error("Node {node_id} not found in graph of context {context_id}")]
    NodeNotFound { context_id: String, node_id: String },

    #[error("Scatter method {0} is not supported")]
    UnsupportedScatterMethod(String),

    #[error("Failed to enable scatter mapping for node {node_id}: {source}")]
    ScatterMappingError {
        node_id: String,
        #[source]
        source: ScatterError,
    },

    #[error("Job {job_id} cannot move from {from} to {to}")]
    InvalidTransition { job_id: String, from: String, to: String },

    #[error("Failed to serialize event: {0}")]
    EventSerializationError(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
