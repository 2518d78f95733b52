use serde_json::Value;

use crate::domain::dag::{DagContainer, DagLinkPort, DagNode, PortType};
use crate::domain::event::{Event, InputUpdateEvent, OutputUpdateEvent};
use crate::domain::handler::output_handler::mark_completed;
use crate::domain::handler::{EngineState, EventHandler};
use crate::domain::model::{JobRecord, JobState, LinkRecord, VariableRecord, as_sequence};
use crate::domain::scatter::ScatterMapping;
use crate::domain::utils::id::JobId;
use crate::error::{Error, Result};

/// Readiness bookkeeping, scatter expansion and container roll-out for input deliveries.
#[derive(Debug, Default)]
pub struct InputEventHandler;

impl EventHandler<InputUpdateEvent> for InputEventHandler {
    fn handle(&self, event: &InputUpdateEvent, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
        let context_id = &event.context_id;
        let port_id = &event.port_id;

        let mut job = state.jobs.get(context_id, &event.job_id)?.clone();
        let mut variable = state.variables.get(context_id, &event.job_id, port_id, PortType::Input)?.clone();
        let (_, node) = state.graphs.node(context_id, &job.node_id)?;

        // A satisfied port takes no further values, even a non-blocking one.
        let merged = !event.from_scatter && !job.is_input_port_ready(port_id);
        if merged {
            variable.add_value(event.value.clone());
            job.decrement_port_counter(port_id, PortType::Input);
        }

        if !job.is_scattered {
            if job.is_scatter_port(port_id) {
                let blocking = node.link_merge(port_id).is_blocking();
                if event.in_place || (!blocking && (merged || event.look_ahead)) {
                    state.variables.update(variable)?;
                    return scatter_port(job, &node, event, state, outbox);
                }
                if !blocking {
                    log::warn!("Scatter port {} of job {} is already satisfied, ignoring value.", port_id, job.id);
                    return Ok(());
                }

                // A blocking scatter port expands once its whole aggregate is known.
                let accepted = event.look_ahead && accept_look_ahead(&mut job, &mut variable, event);
                state.variables.update(variable)?;
                if (merged || accepted) && job.is_input_port_ready(port_id) {
                    return scatter_port(job, &node, event, state, outbox);
                }
                return state.jobs.update(job);
            }

            if job.is_scatter_wrapper {
                if merged && job.is_input_port_ready(port_id) {
                    send_values_to_scattered_jobs(&job, &variable, state, outbox);
                }
                state.variables.update(variable)?;
                return state.jobs.update(job);
            }

            if event.look_ahead {
                accept_look_ahead(&mut job, &mut variable, event);
            } else if event.from_scatter && !job.is_input_port_ready(port_id) {
                variable.add_value(event.value.clone());
                job.decrement_port_counter(port_id, PortType::Input);
            }
        }

        state.variables.update(variable)?;
        if job.state == JobState::Pending && job.is_ready() {
            ready(&mut job, &node, state, outbox)?;
        }
        state.jobs.update(job)
    }
}

/// Records one positional element sent ahead of its scattered siblings.
///
/// The first element fixes the expected number of deliveries to the sibling count.
/// Elements arriving after the port is satisfied are dropped. Returns whether the
/// element was recorded.
fn accept_look_ahead(job: &mut JobRecord, variable: &mut VariableRecord, event: &InputUpdateEvent) -> bool {
    let port_id = &event.port_id;
    let total = event.scattered_nodes.unwrap_or(1);
    let first = job.port_counter(port_id, PortType::Input).map(|c| c.updates == 0).unwrap_or(false);
    if first {
        job.reset_input_port_counter(port_id, total);
        variable.globals_count = total;
    }

    if !job.has_pending_deliveries(port_id, PortType::Input) {
        log::warn!("Job {} port {} is already satisfied, dropping look-ahead value {:?}.", job.id, port_id, event.position);
        return false;
    }

    match event.position {
        Some(position) => variable.set_at(position, event.value.clone()),
        None => variable.add_value(event.value.clone()),
    }
    job.decrement_port_counter(port_id, PortType::Input);
    true
}

/// Marks a job READY. Containers move on to RUNNING and are rolled out.
pub(crate) fn ready(job: &mut JobRecord, node: &DagNode, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
    job.state = JobState::Ready;
    log::debug!("Job {} is ready.", job.id);

    if let Some(container) = &node.container {
        job.state = JobState::Running;
        roll_out_container(job, node, container, state, outbox)?;
    }
    Ok(())
}

/// Instantiates the children and internal links of a container job and feeds its
/// current input values inward.
fn roll_out_container(
    job: &mut JobRecord,
    node: &DagNode,
    container: &DagContainer,
    state: &mut EngineState,
    outbox: &mut Vec<Event>,
) -> Result<()> {
    let context_id = job.context_id.clone();
    let graph = state.graphs.graph(&context_id)?;

    let mut children = Vec::with_capacity(container.children.len());
    for child_id in &container.children {
        let child_node = graph
            .node(child_id)
            .ok_or_else(|| Error::NodeNotFound { context_id: context_id.to_string(), node_id: child_id.to_string() })?;

        let child = JobRecord::new(context_id.clone(), job.id.child(child_node.local_name()), Some(job.id.clone()), child_node);
        for port in child_node.input_ports.iter().chain(&child_node.output_ports) {
            state.variables.create(VariableRecord::new(context_id.clone(), child.id.clone(), port));
        }
        children.push(child.id.clone());
        state.jobs.create(child);
    }

    // Endpoints on the container node itself map onto this job, the rest onto its children.
    let job_id = job.id.clone();
    let resolve = |end: &DagLinkPort| -> JobId {
        if end.node_id == node.id { job_id.clone() } else { job_id.child(end.node_id.local_name()) }
    };

    for link in &container.links {
        let source = resolve(&link.source);
        let destination = resolve(&link.destination);
        let port_id = link.destination.port_id.clone();

        let created = state.links.create(LinkRecord::new(
            context_id.clone(),
            (source.clone(), link.source.port_id.clone(), link.source.port_type),
            (destination.clone(), port_id.clone(), link.destination.port_type),
        ));
        if created.is_none() {
            log::warn!("Duplicate link {}.{} -> {}.{} in container {} is ignored.", source, link.source.port_id, destination, port_id, job_id);
            continue;
        }

        match link.destination.port_type {
            PortType::Input if destination != job_id => {
                state.jobs.get_mut(&context_id, &destination)?.increment_port_counter(&port_id, PortType::Input);
            }
            PortType::Output if destination == job_id => job.increment_port_counter(&port_id, PortType::Output),
            port_type => log::warn!("Link into {} port {}.{} of container {} is not counted.", port_type, destination, port_id, job_id),
        }
    }

    for link in state.links.find_by_source_and_source_type(&context_id, &job.id, PortType::Input) {
        let value = state.variables.get(&context_id, &job.id, &link.source_port_id, PortType::Input)?.value.clone();
        outbox.push(match link.destination_type {
            PortType::Input => InputUpdateEvent::new(context_id.clone(), link.destination_job_id, link.destination_port_id, value).into(),
            PortType::Output => OutputUpdateEvent::new(context_id.clone(), link.destination_job_id, link.destination_port_id, value).into(),
        });
    }

    // Children without incoming links are runnable right away.
    for child_id in children {
        let child = state.jobs.get(&context_id, &child_id)?;
        if child.state != JobState::Pending || !child.is_ready() {
            continue;
        }
        let mut child = child.clone();
        let child_node = graph
            .node(&child.node_id)
            .ok_or_else(|| Error::NodeNotFound { context_id: context_id.to_string(), node_id: child.node_id.to_string() })?;
        ready(&mut child, child_node, state, outbox)?;
        state.jobs.update(child)?;
    }

    log::info!("Container {} rolled out into {} jobs.", job.id, container.children.len());
    Ok(())
}

/// Forwards a wrapper's input value to the clones linked to that port.
fn send_values_to_scattered_jobs(job: &JobRecord, variable: &VariableRecord, state: &EngineState, outbox: &mut Vec<Event>) {
    for link in state.links.find_by_source(&job.context_id, &job.id, &variable.port_id, PortType::Input) {
        outbox.push(InputUpdateEvent::new(job.context_id.clone(), link.destination_job_id, link.destination_port_id, variable.value.clone()).into());
    }
}

fn scatter_port(mut job: JobRecord, node: &DagNode, event: &InputUpdateEvent, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
    let mut mapping = match job.scatter_mapping.take() {
        Some(mapping) => mapping,
        None => ScatterMapping::for_node(node)?,
    };

    let result = match enable_port(&mut job, &mut mapping, node, event, state, outbox) {
        Ok(true) => expand_rows(&mut job, &mut mapping, node, event.scattered_nodes, state, outbox),
        Ok(false) => Ok(()),
        Err(e) => Err(e),
    };
    job.scatter_mapping = Some(mapping);
    result?;
    state.jobs.update(job)
}

/// Feeds the delivered value into the scatter mapping. Returns whether rows may
/// have become available.
fn enable_port(
    job: &mut JobRecord,
    mapping: &mut ScatterMapping,
    node: &DagNode,
    event: &InputUpdateEvent,
    state: &mut EngineState,
    outbox: &mut Vec<Event>,
) -> Result<bool> {
    let port_id = &event.port_id;
    let scatter_error = |source| Error::ScatterMappingError { node_id: node.id.to_string(), source };

    if event.in_place {
        match event.position {
            Some(position) => {
                let total = event.scattered_nodes.unwrap_or(position + 1);
                mapping.enable_at(port_id, position, total, event.value.clone()).map_err(scatter_error)?;
            }
            None => mapping.enable(port_id, as_sequence(&event.value)).map_err(scatter_error)?,
        }
        return Ok(true);
    }

    let mut variable = state.variables.get(&job.context_id, &job.id, port_id, PortType::Input)?.clone();

    if event.look_ahead && !node.link_merge(port_id).is_blocking() {
        let total = event.scattered_nodes.unwrap_or(1);
        let position = event.position.unwrap_or(0);
        if job.port_counter(port_id, PortType::Input).map(|c| c.updates == 0).unwrap_or(false) {
            job.reset_input_port_counter(port_id, total);
            variable.globals_count = total;
        }
        job.decrement_port_counter(port_id, PortType::Input);
        variable.set_at(position, event.value.clone());
        state.variables.update(variable)?;

        mapping.enable_at(port_id, position, total, event.value.clone()).map_err(scatter_error)?;
        return Ok(true);
    }

    if mapping.is_enabled(port_id) {
        log::warn!("Scatter port {} of job {} is already enabled, ignoring value.", port_id, job.id);
        return Ok(false);
    }

    job.is_scatter_wrapper = true;
    let value = if job.is_input_port_ready(port_id) { variable.value.clone() } else { event.value.clone() };
    let values = as_sequence(&value);
    if !value.is_array() {
        variable.value = Value::Array(values.clone());
        variable.is_wrapped = true;
        state.variables.update(variable)?;
    }

    if values.is_empty() {
        mapping.enable(port_id, Vec::new()).map_err(scatter_error)?;
        return Ok(true);
    }

    let total = values.len();
    for (position, value) in values.into_iter().enumerate() {
        outbox.push(InputUpdateEvent::in_place(job.context_id.clone(), job.id.clone(), port_id.clone(), value, position, total).into());
    }
    Ok(false)
}

/// Creates one scattered clone per newly enabled row.
fn expand_rows(
    job: &mut JobRecord,
    mapping: &mut ScatterMapping,
    node: &DagNode,
    scattered_nodes: Option<usize>,
    state: &mut EngineState,
    outbox: &mut Vec<Event>,
) -> Result<()> {
    let context_id = job.context_id.clone();
    let rows = mapping
        .enabled_rows()
        .map_err(|source| Error::ScatterMappingError { node_id: node.id.to_string(), source })?;
    mapping.commit(&rows);

    let count = scattered_nodes.unwrap_or(0).max(mapping.row_count());
    for row in &rows {
        let mut clone = JobRecord::scattered(job, row.index, node);
        let mut events: Vec<Event> = Vec::new();

        for input in &node.input_ports {
            let mut variable = VariableRecord::new(context_id.clone(), clone.id.clone(), input);
            variable.globals_count = count;
            state.variables.create(variable);

            clone.increment_port_counter(&input.id, PortType::Input);
            state.links.create(LinkRecord::new(
                context_id.clone(),
                (job.id.clone(), input.id.clone(), PortType::Input),
                (clone.id.clone(), input.id.clone(), PortType::Input),
            ));

            let value = if input.scatter {
                row.value(&input.id).cloned()
            } else if job.is_input_port_ready(&input.id) {
                Some(state.variables.get(&context_id, &job.id, &input.id, PortType::Input)?.value.clone())
            } else {
                None
            };
            if let Some(value) = value {
                events.push(InputUpdateEvent::new(context_id.clone(), clone.id.clone(), input.id.clone(), value).into());
            }
        }

        for output in &node.output_ports {
            let mut variable = VariableRecord::new(context_id.clone(), clone.id.clone(), output);
            variable.globals_count = count;
            state.variables.create(variable);

            state.links.create(LinkRecord::new(
                context_id.clone(),
                (clone.id.clone(), output.id.clone(), PortType::Output),
                (job.id.clone(), output.id.clone(), PortType::Output),
            ));
        }

        state.jobs.create(clone);
        outbox.extend(events);
    }

    if job.state != JobState::Pending {
        return Ok(());
    }

    if !rows.is_empty() {
        job.is_scatter_wrapper = true;
        job.state = JobState::Running;
        job.reset_output_port_counters(count);
        for output in &node.output_ports {
            let mut variable = state.variables.get(&context_id, &job.id, &output.id, PortType::Output)?.clone();
            variable.globals_count = count;
            state.variables.update(variable)?;
        }
        log::info!("Job {} scattered into {} jobs.", job.id, count);
    } else if mapping.is_complete() && mapping.row_count() == 0 {
        // Nothing to run: every output is an empty sequence.
        job.is_scatter_wrapper = true;
        job.state = JobState::Running;
        job.reset_output_port_counters(1);
        for output in &node.output_ports {
            outbox.push(OutputUpdateEvent::new(context_id.clone(), job.id.clone(), output.id.clone(), Value::Array(Vec::new())).into());
        }
        if node.output_ports.is_empty() {
            mark_completed(job, outbox);
        }
        log::info!("Job {} scattered over an empty sequence.", job.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dag::{LinkMerge, ScatterMethod};
    use crate::domain::event::InitEvent;
    use crate::domain::handler::HandlerController;
    use crate::domain::handler::test_graphs::*;
    use crate::domain::utils::id::{ContextId, NodeId, PortId};
    use serde_json::json;

    /// Applies `event` and everything it causes, in FIFO order.
    fn drain(state: &mut EngineState, event: Event) -> Vec<Event> {
        let controller = HandlerController::new();
        let mut pending = std::collections::VecDeque::from([event]);
        let mut seen = Vec::new();
        while let Some(event) = pending.pop_front() {
            let mut outbox = Vec::new();
            controller.handle(&event, state, &mut outbox).unwrap();
            seen.push(event);
            pending.extend(outbox);
        }
        seen
    }

    fn init(state: &mut EngineState, graph: crate::domain::dag::DagGraph, values: &[(&str, Value)]) -> ContextId {
        let context_id = ContextId::new("ctx");
        let event = Event::Init(InitEvent { context_id: context_id.clone(), graph, inputs: inputs(values), config: json!({}) });
        drain(state, event);
        context_id
    }

    fn job<'a>(state: &'a EngineState, id: &str) -> &'a JobRecord {
        state.jobs.get(&ContextId::new("ctx"), &JobId::new(id)).unwrap()
    }

    fn input_value(state: &EngineState, job: &str, port: &str) -> Value {
        state.variables.get(&ContextId::new("ctx"), &JobId::new(job), &PortId::new(port), PortType::Input).unwrap().value.clone()
    }

    #[test]
    fn test_cartesian_scatter_creates_paired_children() {
        let mut state = EngineState::new();
        init(&mut state, scattered(ScatterMethod::FlatCrossProduct), &[("a", json!(["a1", "a2"])), ("b", json!(["b1", "b2"]))]);

        let wrapper = job(&state, "step");
        assert!(wrapper.is_scatter_wrapper);
        assert_eq!(wrapper.state, JobState::Running);
        assert_eq!(wrapper.port_counter(&PortId::new("out"), PortType::Output).unwrap().counter, 4);

        let pairs: Vec<_> = (1..=4)
            .map(|i| {
                let id = format!("step.{}", i);
                assert_eq!(job(&state, &id).state, JobState::Ready);
                (input_value(&state, &id, "a"), input_value(&state, &id, "b"))
            })
            .collect();
        assert_eq!(
            pairs,
            vec![(json!("a1"), json!("b1")), (json!("a1"), json!("b2")), (json!("a2"), json!("b1")), (json!("a2"), json!("b2"))]
        );
        assert!(state.jobs.find(&ContextId::new("ctx"), &JobId::new("step.5")).is_none());
    }

    #[test]
    fn test_dot_product_scatter_forwards_plain_inputs() {
        let mut node = leaf("step", vec![scatter_input("a"), port("ref", PortType::Input)], vec![port("out", PortType::Output)]);
        node.scatter_method = Some(ScatterMethod::DotProduct);
        let mut state = EngineState::new();
        init(&mut state, graph("step", vec![node]), &[("a", json!([1, 2, 3])), ("ref", json!("genome"))]);

        assert_eq!(state.jobs.find_ready(&ContextId::new("ctx")).len(), 3);
        for i in 1..=3 {
            let id = format!("step.{}", i);
            assert_eq!(input_value(&state, &id, "a"), json!(i));
            assert_eq!(input_value(&state, &id, "ref"), json!("genome"));
        }
    }

    #[test]
    fn test_scalar_on_scatter_port_is_wrapped() {
        let mut node = leaf("step", vec![scatter_input("a")], vec![port("out", PortType::Output)]);
        node.scatter_method = Some(ScatterMethod::DotProduct);
        let mut state = EngineState::new();
        init(&mut state, graph("step", vec![node]), &[("a", json!("only"))]);

        let variable = state.variables.get(&ContextId::new("ctx"), &JobId::new("step"), &PortId::new("a"), PortType::Input).unwrap();
        assert!(variable.is_wrapped);
        assert_eq!(variable.value, json!(["only"]));
        assert_eq!(input_value(&state, "step.1", "a"), json!("only"));
    }

    #[test]
    fn test_nested_cross_product_is_rejected() {
        let mut state = EngineState::new();
        let context_id = ContextId::new("ctx");
        let graph = scattered(ScatterMethod::NestedCrossProduct);
        let controller = HandlerController::new();
        let mut outbox = Vec::new();
        controller
            .handle(&Event::Init(InitEvent { context_id: context_id.clone(), graph, inputs: inputs(&[]), config: json!({}) }), &mut state, &mut outbox)
            .unwrap();

        let first = outbox.remove(0);
        let err = controller.handle(&first, &mut state, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedScatterMethod(_)));
    }

    #[test]
    fn test_mismatched_dot_product_fails() {
        let mut state = EngineState::new();
        let controller = HandlerController::new();
        let context_id = ContextId::new("ctx");
        let graph = scattered(ScatterMethod::DotProduct);
        let init = Event::Init(InitEvent {
            context_id: context_id.clone(),
            graph,
            inputs: inputs(&[("a", json!([1, 2])), ("b", json!([1, 2, 3]))]),
            config: json!({}),
        });

        let mut pending = std::collections::VecDeque::from([init]);
        let mut failure = None;
        while let Some(event) = pending.pop_front() {
            let mut outbox = Vec::new();
            match controller.handle(&event, &mut state, &mut outbox) {
                Ok(()) => pending.extend(outbox),
                Err(e) => failure = Some(e),
            }
        }

        assert!(matches!(failure, Some(Error::ScatterMappingError { .. })));
        assert!(state.jobs.find(&context_id, &JobId::new("step.1")).is_none());
    }

    fn forwarding_container() -> crate::domain::dag::DagGraph {
        let mut root = leaf("main", vec![port("x", PortType::Input)], vec![]);
        root.container = Some(DagContainer {
            children: vec![NodeId::new("main.inner")],
            links: vec![link(end("main", "x", PortType::Input), end("main.inner", "in", PortType::Input))],
        });
        let inner = leaf("main.inner", vec![port("in", PortType::Input)], vec![]);
        graph("main", vec![root, inner])
    }

    #[test]
    fn test_linear_container_rolls_out_children() {
        let mut state = EngineState::new();
        let context_id = init(&mut state, linear(), &[]);

        assert_eq!(job(&state, "main").state, JobState::Running);
        assert_eq!(job(&state, "main").port_counter(&PortId::new("result"), PortType::Output).unwrap().counter, 1);
        assert_eq!(job(&state, "main.producer").state, JobState::Ready);
        assert_eq!(job(&state, "main.consumer").state, JobState::Pending);
        assert_eq!(job(&state, "main.consumer").port_counter(&PortId::new("in"), PortType::Input).unwrap().counter, 1);
        assert_eq!(state.jobs.find_by_context(&context_id).len(), 3);
    }

    #[test]
    fn test_container_rolls_out_once() {
        let mut state = EngineState::new();
        let context_id = init(&mut state, forwarding_container(), &[("x", json!(1))]);
        assert_eq!(job(&state, "main").state, JobState::Running);

        let again = Event::InputUpdate(InputUpdateEvent::new(context_id.clone(), JobId::new("main"), PortId::new("x"), json!(2)));
        let mut outbox = Vec::new();
        HandlerController::new().handle(&again, &mut state, &mut outbox).unwrap();

        assert!(outbox.is_empty());
        assert_eq!(state.jobs.find_by_context(&context_id).len(), 2);
        assert_eq!(input_value(&state, "main", "x"), json!(1));
    }

    #[test]
    fn test_container_input_is_forwarded_inward() {
        let mut state = EngineState::new();
        init(&mut state, forwarding_container(), &[("x", json!(7))]);

        assert_eq!(job(&state, "main.inner").state, JobState::Ready);
        assert_eq!(input_value(&state, "main.inner", "in"), json!(7));
    }

    /// `main(x, y)` with both inputs linked into the same flattened port of `main.c`.
    fn two_links_into_flattened(scatter: bool) -> crate::domain::dag::DagGraph {
        let mut consumer = leaf("main.c", vec![port("in", PortType::Input)], vec![]);
        consumer.input_ports[0].link_merge = LinkMerge::MergeFlattened;
        consumer.input_ports[0].scatter = scatter;
        let mut root = leaf("main", vec![port("x", PortType::Input), port("y", PortType::Input)], vec![]);
        root.container = Some(DagContainer {
            children: vec![NodeId::new("main.c")],
            links: vec![
                link(end("main", "x", PortType::Input), end("main.c", "in", PortType::Input)),
                link(end("main", "y", PortType::Input), end("main.c", "in", PortType::Input)),
            ],
        });
        graph("main", vec![root, consumer])
    }

    #[test]
    fn test_non_blocking_port_is_frozen_once_ready() {
        let mut state = EngineState::new();
        init(&mut state, two_links_into_flattened(false), &[("x", json!([1])), ("y", json!([2, 3]))]);

        let consumer = job(&state, "main.c");
        assert_eq!(consumer.state, JobState::Ready);
        assert_eq!(consumer.port_counter(&PortId::new("in"), PortType::Input).unwrap().updates, 1);
        assert_eq!(input_value(&state, "main.c", "in"), json!([1]));
    }

    #[test]
    fn test_flattened_scatter_port_scatters_once() {
        let mut state = EngineState::new();
        init(&mut state, two_links_into_flattened(true), &[("x", json!([1])), ("y", json!([2, 3]))]);

        let wrapper = job(&state, "main.c");
        assert!(wrapper.is_scatter_wrapper);
        assert_eq!(wrapper.state, JobState::Running);
        assert_eq!(input_value(&state, "main.c", "in"), json!([1]));

        assert_eq!(job(&state, "main.c.1").state, JobState::Ready);
        assert_eq!(input_value(&state, "main.c.1", "in"), json!(1));
        assert!(state.jobs.find(&ContextId::new("ctx"), &JobId::new("main.c.2")).is_none());
    }

    #[test]
    fn test_duplicate_container_link_is_counted_once() {
        let consumer = leaf("main.c", vec![port("in", PortType::Input)], vec![]);
        let mut root = leaf("main", vec![port("x", PortType::Input)], vec![]);
        let forward = link(end("main", "x", PortType::Input), end("main.c", "in", PortType::Input));
        root.container = Some(DagContainer { children: vec![NodeId::new("main.c")], links: vec![forward.clone(), forward] });

        let mut state = EngineState::new();
        init(&mut state, graph("main", vec![root, consumer]), &[("x", json!("value"))]);

        assert_eq!(job(&state, "main.c").state, JobState::Ready);
        assert_eq!(input_value(&state, "main.c", "in"), json!("value"));
    }
}
