use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::domain::dag::PortType;
use crate::domain::model::context_record::ContextRecord;
use crate::domain::model::job_record::{JobRecord, JobState};
use crate::domain::model::link_record::LinkRecord;
use crate::domain::model::variable_record::VariableRecord;
use crate::domain::utils::id::{ContextId, JobId, PortId};
use crate::error::{Error, Result};

new_key_type! {
    pub struct JobKey;
    pub struct VariableKey;
    pub struct LinkKey;
}

type PortKey = (ContextId, JobId, PortId, PortType);

#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: HashMap<ContextId, ContextRecord>,
}

impl ContextStore {
    pub fn create(&mut self, context: ContextRecord) {
        self.contexts.entry(context.id.clone()).or_insert(context);
    }

    pub fn find(&self, id: &ContextId) -> Option<&ContextRecord> {
        self.contexts.get(id)
    }

    pub fn get(&self, id: &ContextId) -> Result<&ContextRecord> {
        self.find(id).ok_or_else(|| Error::ContextNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &ContextId) -> Result<&mut ContextRecord> {
        self.contexts.get_mut(id).ok_or_else(|| Error::ContextNotFound(id.to_string()))
    }
}

/// Job records of all contexts.
#[derive(Debug, Default)]
pub struct JobStore {
    slots: SlotMap<JobKey, JobRecord>,

    /// Index lookup JobKey by (context, job id).
    index: HashMap<(ContextId, JobId), JobKey>,

    /// Jobs of one context in creation order.
    by_context: HashMap<ContextId, Vec<JobKey>>,
}

impl JobStore {
    /// Adds a job. Creating a job that already exists keeps the stored record, so
    /// replayed events do not reset progress.
    pub fn create(&mut self, job: JobRecord) -> JobKey {
        let index_key = (job.context_id.clone(), job.id.clone());
        if let Some(key) = self.index.get(&index_key) {
            log::debug!("Job {} already exists in context {}.", job.id, job.context_id);
            return *key;
        }

        let context_id = job.context_id.clone();
        let key = self.slots.insert(job);
        self.index.insert(index_key, key);
        self.by_context.entry(context_id).or_default().push(key);
        key
    }

    pub fn find(&self, context_id: &ContextId, job_id: &JobId) -> Option<&JobRecord> {
        let key = self.index.get(&(context_id.clone(), job_id.clone()))?;
        self.slots.get(*key)
    }

    pub fn get(&self, context_id: &ContextId, job_id: &JobId) -> Result<&JobRecord> {
        self.find(context_id, job_id)
            .ok_or_else(|| Error::JobNotFound { context_id: context_id.to_string(), job_id: job_id.to_string() })
    }

    pub fn get_mut(&mut self, context_id: &ContextId, job_id: &JobId) -> Result<&mut JobRecord> {
        let key = self
            .index
            .get(&(context_id.clone(), job_id.clone()))
            .ok_or_else(|| Error::JobNotFound { context_id: context_id.to_string(), job_id: job_id.to_string() })?;
        self.slots
            .get_mut(*key)
            .ok_or_else(|| Error::JobNotFound { context_id: context_id.to_string(), job_id: job_id.to_string() })
    }

    /// Persists a modified copy of a job.
    pub fn update(&mut self, job: JobRecord) -> Result<()> {
        let stored = self.get_mut(&job.context_id.clone(), &job.id.clone())?;
        *stored = job;
        Ok(())
    }

    pub fn find_by_context(&self, context_id: &ContextId) -> Vec<&JobRecord> {
        self.by_context
            .get(context_id)
            .map(|keys| keys.iter().filter_map(|key| self.slots.get(*key)).collect())
            .unwrap_or_default()
    }

    /// READY jobs of a context, in creation order.
    pub fn find_ready(&self, context_id: &ContextId) -> Vec<&JobRecord> {
        self.find_by_context(context_id).into_iter().filter(|job| job.state == JobState::Ready).collect()
    }

    pub fn find_root(&self, context_id: &ContextId) -> Option<&JobRecord> {
        self.find_by_context(context_id).into_iter().find(|job| job.is_root())
    }
}

#[derive(Debug, Default)]
pub struct VariableStore {
    slots: SlotMap<VariableKey, VariableRecord>,
    index: HashMap<PortKey, VariableKey>,
    by_job: HashMap<(ContextId, JobId), Vec<VariableKey>>,
}

impl VariableStore {
    pub fn create(&mut self, variable: VariableRecord) -> VariableKey {
        let index_key = (variable.context_id.clone(), variable.job_id.clone(), variable.port_id.clone(), variable.port_type);
        if let Some(key) = self.index.get(&index_key) {
            return *key;
        }

        let job_key = (variable.context_id.clone(), variable.job_id.clone());
        let key = self.slots.insert(variable);
        self.index.insert(index_key, key);
        self.by_job.entry(job_key).or_default().push(key);
        key
    }

    pub fn find(&self, context_id: &ContextId, job_id: &JobId, port_id: &PortId, port_type: PortType) -> Option<&VariableRecord> {
        let key = self.index.get(&(context_id.clone(), job_id.clone(), port_id.clone(), port_type))?;
        self.slots.get(*key)
    }

    pub fn get(&self, context_id: &ContextId, job_id: &JobId, port_id: &PortId, port_type: PortType) -> Result<&VariableRecord> {
        self.find(context_id, job_id, port_id, port_type).ok_or_else(|| Error::VariableNotFound {
            context_id: context_id.to_string(),
            job_id: job_id.to_string(),
            port_id: port_id.to_string(),
            port_type: port_type.to_string(),
        })
    }

    pub fn update(&mut self, variable: VariableRecord) -> Result<()> {
        let index_key = (variable.context_id.clone(), variable.job_id.clone(), variable.port_id.clone(), variable.port_type);
        let stored = self.index.get(&index_key).and_then(|key| self.slots.get_mut(*key)).ok_or_else(|| Error::VariableNotFound {
            context_id: variable.context_id.to_string(),
            job_id: variable.job_id.to_string(),
            port_id: variable.port_id.to_string(),
            port_type: variable.port_type.to_string(),
        })?;
        *stored = variable;
        Ok(())
    }

    /// Variables of one job and direction, in declaration order.
    pub fn find_by_job(&self, context_id: &ContextId, job_id: &JobId, port_type: PortType) -> Vec<&VariableRecord> {
        self.by_job
            .get(&(context_id.clone(), job_id.clone()))
            .map(|keys| keys.iter().filter_map(|key| self.slots.get(*key)).filter(|v| v.port_type == port_type).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct LinkStore {
    slots: SlotMap<LinkKey, LinkRecord>,
    by_source: HashMap<PortKey, Vec<LinkKey>>,
    by_source_job: HashMap<(ContextId, JobId), Vec<LinkKey>>,
    destination_count: HashMap<PortKey, usize>,
}

impl LinkStore {
    /// Adds a link. Returns `None` when an identical link is already stored.
    pub fn create(&mut self, link: LinkRecord) -> Option<LinkKey> {
        let source_key = (link.context_id.clone(), link.source_job_id.clone(), link.source_port_id.clone(), link.source_type);
        if self.by_source.get(&source_key).is_some_and(|keys| keys.iter().any(|key| self.slots.get(*key) == Some(&link))) {
            return None;
        }

        let destination_key =
            (link.context_id.clone(), link.destination_job_id.clone(), link.destination_port_id.clone(), link.destination_type);
        let job_key = (link.context_id.clone(), link.source_job_id.clone());

        let key = self.slots.insert(link);
        self.by_source.entry(source_key).or_default().push(key);
        self.by_source_job.entry(job_key).or_default().push(key);
        *self.destination_count.entry(destination_key).or_insert(0) += 1;
        Some(key)
    }

    /// Links leaving one port, in creation order.
    pub fn find_by_source(&self, context_id: &ContextId, job_id: &JobId, port_id: &PortId, port_type: PortType) -> Vec<LinkRecord> {
        self.by_source
            .get(&(context_id.clone(), job_id.clone(), port_id.clone(), port_type))
            .map(|keys| keys.iter().filter_map(|key| self.slots.get(*key)).cloned().collect())
            .unwrap_or_default()
    }

    /// Links leaving any port of the given direction on one job.
    pub fn find_by_source_and_source_type(&self, context_id: &ContextId, job_id: &JobId, port_type: PortType) -> Vec<LinkRecord> {
        self.by_source_job
            .get(&(context_id.clone(), job_id.clone()))
            .map(|keys| keys.iter().filter_map(|key| self.slots.get(*key)).filter(|l| l.source_type == port_type).cloned().collect())
            .unwrap_or_default()
    }

    pub fn count_by_destination(&self, context_id: &ContextId, job_id: &JobId, port_id: &PortId, port_type: PortType) -> usize {
        self.destination_count.get(&(context_id.clone(), job_id.clone(), port_id.clone(), port_type)).copied().unwrap_or(0)
    }
}
