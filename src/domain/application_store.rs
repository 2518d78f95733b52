use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

/// Resolves the application payload a node refers to by hash.
pub trait ApplicationStore: std::fmt::Debug + Send + Sync {
    fn find(&self, app_hash: &str) -> Option<Value>;
}

#[derive(Debug, Default)]
pub struct MemoryApplicationStore {
    applications: RwLock<HashMap<String, Value>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, app_hash: impl Into<String>, application: Value) {
        self.applications.write().unwrap_or_else(PoisonError::into_inner).insert(app_hash.into(), application);
    }
}

impl ApplicationStore for MemoryApplicationStore {
    fn find(&self, app_hash: &str) -> Option<Value> {
        self.applications.read().unwrap_or_else(PoisonError::into_inner).get(app_hash).cloned()
    }
}
