// Import-Deploy workflow module for edgeops
//
// A two-phase state machine: import an artifact bundle, then deploy the
// newly created revision when a target environment was configured. Phases
// run strictly in order; a failure in either phase halts the workflow.

pub mod import_deploy;
pub mod types;

// Re-export commonly used types
pub use import_deploy::ImportDeploy;
pub use types::{Phase, WorkflowOutcome, WorkflowUpdate, DEFAULT_BASEPATH};
