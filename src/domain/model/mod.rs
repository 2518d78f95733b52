pub mod context_record;
pub mod job_record;
pub mod link_record;
pub mod record_store;
pub mod variable_record;

pub use context_record::{ContextRecord, ContextStatus};
pub use job_record::{JobRecord, JobState, PortCounter};
pub use link_record::LinkRecord;
pub use record_store::{ContextStore, JobStore, LinkStore, VariableStore};
pub use variable_record::{VariableRecord, as_sequence};
