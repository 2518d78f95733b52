use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};

use workflow_engine::WorkflowEngine;
use workflow_engine::api::dag_dto::DagDto;
use workflow_engine::domain::dag::{DagGraph, PortType};
use workflow_engine::domain::model::{ContextStatus, JobState};
use workflow_engine::domain::processor::{DispatchStrategy, EngineConfig};
use workflow_engine::domain::utils::id::{ContextId, JobId, PortId};

fn graph(value: Value) -> DagGraph {
    let dto: DagDto = serde_json::from_value(value).unwrap();
    DagGraph::try_from(dto).unwrap()
}

/// `main(x) -> a -> b -> main(y)`
fn two_step_pipeline() -> DagGraph {
    graph(json!({
        "id": "main",
        "inputs": [{ "id": "x" }],
        "outputs": [{ "id": "y" }],
        "children": [
            { "id": "a", "inputs": [{ "id": "in" }], "outputs": [{ "id": "out" }] },
            { "id": "b", "inputs": [{ "id": "in" }], "outputs": [{ "id": "out" }] }
        ],
        "links": [
            { "from": { "port": "x" }, "to": { "node": "a", "port": "in" } },
            { "from": { "node": "a", "port": "out" }, "to": { "node": "b", "port": "in" } },
            { "from": { "node": "b", "port": "out" }, "to": { "port": "y" } }
        ]
    }))
}

fn cross_product_step() -> DagGraph {
    graph(json!({
        "id": "step",
        "inputs": [{ "id": "a", "scatter": true }, { "id": "b", "scatter": true }],
        "outputs": [{ "id": "out" }],
        "scatterMethod": "flat_cross_product"
    }))
}

fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn ids(engine: &WorkflowEngine, context_id: &ContextId) -> Vec<String> {
    engine.ready_jobs(context_id).unwrap().into_iter().map(|job| job.name.to_string()).collect()
}

#[test]
fn test_pipeline_runs_to_completion() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let context_id = ContextId::new("run-1");
    engine.start_run_with_id(context_id.clone(), two_step_pipeline(), values(&[("x", json!("reads.fq"))]), json!({"threads": 4})).unwrap();

    assert_eq!(engine.run_until_idle().unwrap(), 1);
    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Running));
    assert_eq!(engine.job(&context_id, &JobId::new("main")).unwrap().state, JobState::Running);

    let ready = engine.ready_jobs(&context_id).unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].name, JobId::new("main.a"));
    assert_eq!(ready[0].parent_id, Some(JobId::new("main")));
    assert_eq!(ready[0].inputs.get("in"), Some(&json!("reads.fq")));
    assert_eq!(ready[0].config, json!({"threads": 4}));

    engine.mark_running(&context_id, &JobId::new("main.a")).unwrap();
    assert!(engine.ready_jobs(&context_id).unwrap().is_empty());
    engine.complete_job(&context_id, &JobId::new("main.a"), values(&[("out", json!("a.bam"))])).unwrap();

    assert_eq!(ids(&engine, &context_id), vec!["main.b"]);
    let forwarded = engine.variable(&context_id, &JobId::new("main.b"), &PortId::new("in"), PortType::Input).unwrap();
    assert_eq!(forwarded.value, json!("a.bam"));

    engine.complete_job(&context_id, &JobId::new("main.b"), values(&[("out", json!("b.vcf"))])).unwrap();

    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Completed));
    assert_eq!(engine.job(&context_id, &JobId::new("main")).unwrap().state, JobState::Completed);
    assert_eq!(engine.outputs(&context_id).unwrap(), values(&[("y", json!("b.vcf"))]));
}

#[test]
fn test_cross_product_aggregates_in_row_order() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let context_id = ContextId::new("run-2");
    engine.start_run_with_id(context_id.clone(), cross_product_step(), values(&[("a", json!([1, 2])), ("b", json!(["x", "y"]))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();

    let ready = engine.ready_jobs(&context_id).unwrap();
    let mut rows: Vec<_> = ready.iter().map(|job| (job.name.to_string(), job.inputs.get("a").cloned().unwrap(), job.inputs.get("b").cloned().unwrap())).collect();
    rows.sort_by(|left, right| left.0.cmp(&right.0));
    assert_eq!(
        rows,
        vec![
            ("step.1".to_string(), json!(1), json!("x")),
            ("step.2".to_string(), json!(1), json!("y")),
            ("step.3".to_string(), json!(2), json!("x")),
            ("step.4".to_string(), json!(2), json!("y")),
        ]
    );

    // Finish out of order; the aggregate still follows row order.
    for index in [3, 1, 4, 2] {
        let name = JobId::new(format!("step.{}", index));
        engine.complete_job(&context_id, &name, values(&[("out", json!(index * 10))])).unwrap();
    }

    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Completed));
    assert_eq!(engine.outputs(&context_id).unwrap(), values(&[("out", json!([10, 20, 30, 40]))]));
}

#[test]
fn test_failed_job_invalidates_only_its_run() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let failing = ContextId::new("failing");
    let healthy = ContextId::new("healthy");
    engine.start_run_with_id(failing.clone(), two_step_pipeline(), values(&[("x", json!(1))]), Value::Null).unwrap();
    engine.start_run_with_id(healthy.clone(), two_step_pipeline(), values(&[("x", json!(2))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();

    engine.fail_job(&failing, &JobId::new("main.a")).unwrap();
    assert_eq!(engine.context_status(&failing), Some(ContextStatus::Failed));
    assert_eq!(engine.job(&failing, &JobId::new("main.a")).unwrap().state, JobState::Failed);

    // Later results for the failed run change nothing.
    engine.complete_job(&failing, &JobId::new("main.a"), values(&[("out", json!("late"))])).unwrap();
    assert_eq!(engine.job(&failing, &JobId::new("main.b")).unwrap().state, JobState::Pending);

    engine.complete_job(&healthy, &JobId::new("main.a"), values(&[("out", json!("ok"))])).unwrap();
    assert_eq!(ids(&engine, &healthy), vec!["main.b"]);
    assert_eq!(engine.context_status(&healthy), Some(ContextStatus::Running));
}

#[test]
fn test_unknown_job_report_fails_the_run() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let context_id = ContextId::new("run-3");
    engine.start_run_with_id(context_id.clone(), two_step_pipeline(), values(&[("x", json!(1))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();

    engine.complete_job(&context_id, &JobId::new("main.ghost"), Map::new()).unwrap();

    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Failed));
    assert!(!engine.processor().is_stopped());
}

#[test]
fn test_queued_dispatch_defers_to_the_consumer() {
    let config = EngineConfig { dispatch: DispatchStrategy::Queued, ..EngineConfig::default() };
    let engine = WorkflowEngine::new(config);
    let context_id = engine.start_run(two_step_pipeline(), values(&[("x", json!("in"))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(ids(&engine, &context_id), vec!["main.a"]);

    engine.complete_job(&context_id, &JobId::new("main.a"), values(&[("out", json!("mid"))])).unwrap();
    // The report waits in the queue, so nothing has moved yet.
    assert_eq!(engine.processor().queued(), 1);
    assert_eq!(ids(&engine, &context_id), vec!["main.a"]);

    engine.run_until_idle().unwrap();
    assert_eq!(ids(&engine, &context_id), vec!["main.b"]);

    engine.complete_job(&context_id, &JobId::new("main.b"), values(&[("out", json!("done"))])).unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(engine.outputs(&context_id).unwrap(), values(&[("y", json!("done"))]));
}

#[test]
fn test_background_consumer_drives_runs() {
    let config = EngineConfig { poll_interval: Duration::from_millis(5), ..EngineConfig::default() };
    let engine = WorkflowEngine::new(config);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.add_observer(move |context_id: &ContextId, iteration: u64| sink.lock().unwrap().push((context_id.to_string(), iteration)));

    engine.start().unwrap();
    let context_id = engine.start_run(two_step_pipeline(), values(&[("x", json!(7))]), Value::Null).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.ready_jobs(&context_id).unwrap().is_empty() {
        assert!(Instant::now() < deadline, "consumer never processed the init event");
        std::thread::sleep(Duration::from_millis(5));
    }
    engine.stop();

    assert!(engine.processor().is_stopped());
    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|(id, _)| id == context_id.as_str()));
    assert!(seen.windows(2).all(|pair| pair[0].1 < pair[1].1));
}

#[test]
fn test_empty_scatter_completes_without_children() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let context_id = ContextId::new("run-4");
    let step = graph(json!({
        "id": "step",
        "inputs": [{ "id": "items", "scatter": true }],
        "outputs": [{ "id": "out" }],
        "scatterMethod": "dot_product"
    }));
    engine.start_run_with_id(context_id.clone(), step, values(&[("items", json!([]))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();

    assert!(engine.ready_jobs(&context_id).unwrap().is_empty());
    assert_eq!(engine.jobs(&context_id).len(), 1);
    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Completed));
    assert_eq!(engine.outputs(&context_id).unwrap(), values(&[("out", json!([]))]));
}

#[test]
fn test_scatter_over_container_rolls_out_each_clone() {
    let engine = WorkflowEngine::new(EngineConfig::default());
    let context_id = ContextId::new("run-5");
    let nested = graph(json!({
        "id": "main",
        "inputs": [{ "id": "xs" }],
        "outputs": [{ "id": "ys" }],
        "children": [{
            "id": "sub",
            "inputs": [{ "id": "x", "scatter": true }],
            "outputs": [{ "id": "y" }],
            "scatterMethod": "dot_product",
            "children": [
                { "id": "t", "inputs": [{ "id": "in" }], "outputs": [{ "id": "out" }] }
            ],
            "links": [
                { "from": { "port": "x" }, "to": { "node": "t", "port": "in" } },
                { "from": { "node": "t", "port": "out" }, "to": { "port": "y" } }
            ]
        }],
        "links": [
            { "from": { "port": "xs" }, "to": { "node": "sub", "port": "x" } },
            { "from": { "node": "sub", "port": "y" }, "to": { "port": "ys" } }
        ]
    }));
    engine.start_run_with_id(context_id.clone(), nested, values(&[("xs", json!(["a", "b"]))]), Value::Null).unwrap();
    engine.run_until_idle().unwrap();

    let wrapper = engine.job(&context_id, &JobId::new("main.sub")).unwrap();
    assert!(wrapper.is_scatter_wrapper);
    assert_eq!(wrapper.state, JobState::Running);
    for clone in ["main.sub.1", "main.sub.2"] {
        let clone = engine.job(&context_id, &JobId::new(clone)).unwrap();
        assert!(clone.is_scattered && clone.is_container);
        assert_eq!(clone.state, JobState::Running);
    }

    let mut ready = engine.ready_jobs(&context_id).unwrap();
    ready.sort_by(|left, right| left.name.cmp(&right.name));
    let rows: Vec<_> = ready.iter().map(|job| (job.name.to_string(), job.parent_id.clone(), job.inputs.get("in").cloned())).collect();
    assert_eq!(
        rows,
        vec![
            ("main.sub.1.t".to_string(), Some(JobId::new("main.sub.1")), Some(json!("a"))),
            ("main.sub.2.t".to_string(), Some(JobId::new("main.sub.2")), Some(json!("b"))),
        ]
    );

    // Finish the second row first; the wrapper still aggregates by position.
    engine.complete_job(&context_id, &JobId::new("main.sub.2.t"), values(&[("out", json!("r2"))])).unwrap();
    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Running));
    engine.complete_job(&context_id, &JobId::new("main.sub.1.t"), values(&[("out", json!("r1"))])).unwrap();

    assert_eq!(engine.job(&context_id, &JobId::new("main.sub")).unwrap().state, JobState::Completed);
    assert_eq!(engine.context_status(&context_id), Some(ContextStatus::Completed));
    assert_eq!(engine.outputs(&context_id).unwrap(), values(&[("ys", json!(["r1", "r2"]))]));
}
