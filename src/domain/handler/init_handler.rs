use serde_json::Value;

use crate::domain::dag::PortType;
use crate::domain::event::{Event, InitEvent, InputUpdateEvent};
use crate::domain::handler::input_handler::ready;
use crate::domain::handler::{EngineState, EventHandler};
use crate::domain::model::{ContextRecord, JobRecord, VariableRecord};
use crate::domain::utils::id::JobId;
use crate::error::{Error, Result};

/// Starts a run: registers its graph and instantiates the root job.
#[derive(Debug, Default)]
pub struct InitEventHandler;

impl EventHandler<InitEvent> for InitEventHandler {
    fn handle(&self, event: &InitEvent, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
        let context_id = &event.context_id;
        state.contexts.create(ContextRecord::new(context_id.clone(), event.config.clone()));

        let graph = state.graphs.register(context_id.clone(), event.graph.clone());
        let root = graph
            .root_node()
            .ok_or_else(|| Error::GraphConstructionError(format!("root node {} is missing", graph.root)))?;

        let job_id = JobId::new(root.id.as_str());
        if state.jobs.find(context_id, &job_id).is_some() {
            log::warn!("Context {} was already initialized.", context_id);
            return Ok(());
        }

        let mut job = JobRecord::new(context_id.clone(), job_id, None, root);
        for port in &root.input_ports {
            job.increment_port_counter(&port.id, PortType::Input);
        }
        for port in root.input_ports.iter().chain(&root.output_ports) {
            state.variables.create(VariableRecord::new(context_id.clone(), job.id.clone(), port));
        }
        state.jobs.create(job.clone());
        log::info!("Context {} started with root job {}.", context_id, job.id);

        for port in &root.input_ports {
            let value = event.inputs.get(port.id.as_str()).cloned().or_else(|| port.default.clone()).unwrap_or(Value::Null);
            outbox.push(InputUpdateEvent::new(context_id.clone(), job.id.clone(), port.id.clone(), value).into());
        }

        if job.is_ready() {
            ready(&mut job, root, state, outbox)?;
            state.jobs.update(job)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dag::{DagPort, LinkMerge};
    use crate::domain::handler::test_graphs::*;
    use crate::domain::model::ContextStatus;
    use crate::domain::utils::id::{ContextId, PortId};
    use serde_json::json;

    #[test]
    fn test_root_inputs_are_delivered_with_defaults() {
        let defaulted = DagPort {
            id: PortId::new("threads"),
            port_type: PortType::Input,
            scatter: false,
            link_merge: LinkMerge::MergeNested,
            default: Some(json!(4)),
        };
        let root = leaf("tool", vec![port("reads", PortType::Input), defaulted, port("extra", PortType::Input)], vec![]);
        let event = InitEvent {
            context_id: ContextId::new("ctx"),
            graph: graph("tool", vec![root]),
            inputs: inputs(&[("reads", json!("r.fq"))]),
            config: json!({"allocated": true}),
        };

        let mut state = EngineState::new();
        let mut outbox = Vec::new();
        InitEventHandler.handle(&event, &mut state, &mut outbox).unwrap();

        let values: Vec<_> = outbox
            .iter()
            .map(|e| match e {
                Event::InputUpdate(e) => (e.port_id.to_string(), e.value.clone()),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(values, vec![("reads".to_string(), json!("r.fq")), ("threads".to_string(), json!(4)), ("extra".to_string(), Value::Null)]);

        let context = state.contexts.get(&ContextId::new("ctx")).unwrap();
        assert_eq!(context.status, ContextStatus::Running);
        assert_eq!(context.config, json!({"allocated": true}));
        assert_eq!(state.jobs.find_root(&ContextId::new("ctx")).unwrap().port_counter(&PortId::new("reads"), PortType::Input).unwrap().counter, 1);
    }

    #[test]
    fn test_missing_root_is_a_construction_error() {
        let broken = graph("tool", vec![leaf("other", vec![], vec![])]);
        let event = InitEvent { context_id: ContextId::new("ctx"), graph: broken, inputs: inputs(&[]), config: Value::Null };

        let err = InitEventHandler.handle(&event, &mut EngineState::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::GraphConstructionError(_)));
    }
}
