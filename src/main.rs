use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use workflow_engine::WorkflowEngine;
use workflow_engine::api::engine_config_dto::EngineConfigDto;
use workflow_engine::domain::job_helper::Job;
use workflow_engine::domain::model::ContextStatus;
use workflow_engine::domain::utils::id::ContextId;
use workflow_engine::loader::parser::{load_dag, parse_json_file};
use workflow_engine::logger;

#[derive(Parser, Debug)]
#[command(name = "workflow-engine", version, about = "Runs a workflow graph with an echo task runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Loads a graph, runs it to completion and prints the root outputs.
    Run {
        /// Workflow definition (JSON).
        #[arg(long)]
        dag: PathBuf,
        /// Root input values as a JSON object.
        #[arg(long)]
        inputs: Option<PathBuf>,
        /// Engine configuration (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { dag, inputs, config } => run(dag, inputs, config),
    }
}

fn run(dag: PathBuf, inputs: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let graph = load_dag(&dag).with_context(|| format!("failed to load workflow from '{}'", dag.display()))?;
    let inputs: Map<String, Value> = match inputs {
        Some(path) => parse_json_file(&path).with_context(|| format!("failed to read inputs from '{}'", path.display()))?,
        None => Map::new(),
    };
    let config: EngineConfigDto = match config {
        Some(path) => parse_json_file(&path).with_context(|| format!("failed to read engine config from '{}'", path.display()))?,
        None => EngineConfigDto::default(),
    };

    let engine = WorkflowEngine::new(config.into());
    let context_id = engine.start_run(graph, inputs, Value::Null)?;
    engine.run_until_idle()?;

    loop {
        let ready = engine.ready_jobs(&context_id)?;
        if ready.is_empty() || engine.context_status(&context_id) != Some(ContextStatus::Running) {
            break;
        }
        for job in ready {
            log::info!("Running job {} ({}).", job.name, job.id);
            engine.mark_running(&context_id, &job.name)?;
            let outputs = echo_outputs(&engine, &context_id, &job);
            engine.complete_job(&context_id, &job.name, outputs)?;
        }
        engine.run_until_idle()?;
    }

    let report = serde_json::json!({
        "context": context_id,
        "status": engine.context_status(&context_id),
        "outputs": engine.outputs(&context_id)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Each output port echoes the same-named input, or the whole input map.
fn echo_outputs(engine: &WorkflowEngine, context_id: &ContextId, job: &Job) -> Map<String, Value> {
    let Some(record) = engine.job(context_id, &job.name) else {
        return Map::new();
    };
    record
        .output_counters()
        .iter()
        .map(|counter| {
            let port = counter.port_id.to_string();
            let value = job.inputs.get(&port).cloned().unwrap_or_else(|| Value::Object(job.inputs.clone()));
            (port, value)
        })
        .collect()
}
