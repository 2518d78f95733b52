use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// String identifier tagged with the kind of record it names.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<T> {
    pub id: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> From<&str> for Id<T> {
    fn from(id: &str) -> Self {
        Id::new(id)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct ContextTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct JobTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct NodeTag;
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct PortTag;

pub type ContextId = Id<ContextTag>;
pub type JobId = Id<JobTag>;
pub type NodeId = Id<NodeTag>;
pub type PortId = Id<PortTag>;

impl JobId {
    /// Id of a job nested below this one, either a container child or a scattered clone.
    pub fn child(&self, part: impl fmt::Display) -> JobId {
        JobId::new(format!("{}.{}", self.id, part))
    }
}

impl NodeId {
    /// Last segment of the node path.
    pub fn local_name(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }
}

/// Opaque, globally unique id handed to the task execution layer.
pub fn generate_external_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ids_nest_with_dots() {
        let root = JobId::new("root");
        assert_eq!(root.child("step").child(2).as_str(), "root.step.2");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let port = PortId::new("reads");
        assert_eq!(serde_json::to_string(&port).unwrap(), "\"reads\"");
        let back: PortId = serde_json::from_str("\"reads\"").unwrap();
        assert_eq!(back, port);
    }

    #[test]
    fn test_debug_names_the_id_kind() {
        assert_eq!(format!("{:?}", ContextId::new("c1")), "ContextId: \"c1\"");
    }
}
