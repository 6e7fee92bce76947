// Workflow types for edgeops
//
// States, progress updates, and terminal outcomes of the import-deploy
// state machine.

use serde::Serialize;

use crate::client::{ArtifactKind, DeploymentDescriptor, ImportReceipt};

/// Basepath used when deploying a proxy without an explicit one
pub const DEFAULT_BASEPATH: &str = "/";

/// States of the import-deploy state machine
///
/// `START → IMPORTING → IMPORTED → (DEPLOYING → DEPLOYED | SKIPPED) → DONE`,
/// with FAILED reachable from IMPORTING or DEPLOYING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Start,
    Importing,
    Imported,
    Deploying,
    Deployed,
    Skipped,
    Failed,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Start => "start",
            Phase::Importing => "importing",
            Phase::Imported => "imported",
            Phase::Deploying => "deploying",
            Phase::Deployed => "deployed",
            Phase::Skipped => "skipped",
            Phase::Failed => "failed",
            Phase::Done => "done",
        };
        write!(f, "{}", label)
    }
}

/// Progress update emitted while a workflow runs
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowUpdate {
    /// Import phase started
    Importing { kind: ArtifactKind, name: String },
    /// Import succeeded, yielding a new revision
    Imported { receipt: ImportReceipt },
    /// Deploy phase started
    Deploying { descriptor: DeploymentDescriptor },
    /// Deploy succeeded
    Deployed { descriptor: DeploymentDescriptor },
    /// No target environment configured; workflow finished without deploying
    Skipped { receipt: ImportReceipt },
    /// A phase failed; the workflow halted
    Failed { phase: Phase, message: String },
}

/// Terminal result of a successful workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum WorkflowOutcome {
    /// Imported and deployed
    Deployed { descriptor: DeploymentDescriptor },
    /// Imported only; no deployment target was requested. This is a
    /// success, not a hidden failure.
    Skipped { receipt: ImportReceipt },
}

impl WorkflowOutcome {
    /// Terminal state the run ended in
    pub fn terminal_phase(&self) -> Phase {
        match self {
            WorkflowOutcome::Deployed { .. } => Phase::Deployed,
            WorkflowOutcome::Skipped { .. } => Phase::Skipped,
        }
    }

    /// Name and revision the import produced
    pub fn revision(&self) -> (&str, u32) {
        match self {
            WorkflowOutcome::Deployed { descriptor } => (&descriptor.name, descriptor.revision),
            WorkflowOutcome::Skipped { receipt } => (&receipt.name, receipt.revision),
        }
    }
}
