use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::utils::id::ContextId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextStatus {
    Running,
    Completed,
    Failed,
}

/// One workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    pub id: ContextId,
    pub status: ContextStatus,
    pub config: Value,
}

impl ContextRecord {
    pub fn new(id: ContextId, config: Value) -> Self {
        Self { id, status: ContextStatus::Running, config }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ContextStatus::Failed
    }

    /// Applies a status change. FAILED is absorbing; returns whether the status changed.
    pub fn set_status(&mut self, status: ContextStatus) -> bool {
        if self.is_failed() || self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_context_never_recovers() {
        let mut context = ContextRecord::new(ContextId::new("c"), Value::Null);

        assert!(context.set_status(ContextStatus::Failed));
        assert!(!context.set_status(ContextStatus::Running));
        assert!(!context.set_status(ContextStatus::Completed));
        assert_eq!(context.status, ContextStatus::Failed);
    }
}
