pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

pub use domain::engine::WorkflowEngine;
pub use loader::parser::load_dag;
