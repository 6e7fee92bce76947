// Import-Deploy workflow execution for edgeops
//
// The artifact kind is resolved once at construction; it fixes which
// sub-collection is used and whether the deployment descriptor carries a
// basepath for the remainder of the run. Deployment only ever uses the
// revision number returned by the import.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::types::{Phase, WorkflowOutcome, WorkflowUpdate, DEFAULT_BASEPATH};
use crate::client::{ArtifactKind, DeploymentDescriptor, ImportReceipt, Org};
use crate::error::{EdgeError, Result};

/// Two-phase import-then-conditional-deploy workflow
#[derive(Debug)]
pub struct ImportDeploy {
    /// Artifact kind, fixed for the whole run
    kind: ArtifactKind,
    /// Target artifact name
    name: String,
    /// Bundle source directory
    src_dir: PathBuf,
    /// Deployment target; when absent the workflow ends in SKIPPED
    environment: Option<String>,
    /// Basepath override (proxies only)
    basepath: Option<String>,
    /// Progress sender for phase updates
    progress_sender: Option<mpsc::UnboundedSender<WorkflowUpdate>>,
}

impl ImportDeploy {
    /// Create a workflow that imports `name` from `src_dir`
    pub fn new(kind: ArtifactKind, name: impl Into<String>, src_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
            src_dir: src_dir.into(),
            environment: None,
            basepath: None,
            progress_sender: None,
        }
    }

    /// Request deployment of the imported revision to an environment
    pub fn deploy_to(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Override the basepath used when deploying a proxy
    pub fn with_basepath(mut self, basepath: impl Into<String>) -> Self {
        self.basepath = Some(basepath.into());
        self
    }

    /// Set up progress reporting
    pub fn with_progress_reporting(mut self) -> (Self, mpsc::UnboundedReceiver<WorkflowUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.progress_sender = Some(sender);
        (self, receiver)
    }

    fn emit(&self, update: WorkflowUpdate) {
        if let Some(sender) = &self.progress_sender {
            let _ = sender.send(update);
        }
    }

    /// Run the workflow to completion against an organization
    pub async fn run(&self, org: &Org) -> Result<WorkflowOutcome> {
        // Kind dispatch happens exactly once; the store is never re-selected
        let store = org.artifacts(self.kind);

        info!("Importing {} {}", self.kind, self.name);
        self.emit(WorkflowUpdate::Importing {
            kind: self.kind,
            name: self.name.clone(),
        });

        let receipt = match store.import_from_source(&self.name, &self.src_dir).await {
            Ok(receipt) => receipt,
            Err(e) => {
                let e = into_import_error(&self.name, e);
                self.emit(WorkflowUpdate::Failed {
                    phase: Phase::Importing,
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        info!(
            "Import ok. {} name: {} r{}",
            self.kind, receipt.name, receipt.revision
        );
        self.emit(WorkflowUpdate::Imported {
            receipt: receipt.clone(),
        });

        let Some(environment) = &self.environment else {
            info!("No target environment configured, not deploying");
            self.emit(WorkflowUpdate::Skipped {
                receipt: receipt.clone(),
            });
            return Ok(WorkflowOutcome::Skipped { receipt });
        };

        let descriptor = self.descriptor(&receipt, environment);
        info!(
            "Deploying {} r{} to {}",
            descriptor.name, descriptor.revision, descriptor.environment
        );
        self.emit(WorkflowUpdate::Deploying {
            descriptor: descriptor.clone(),
        });

        if let Err(e) = store.deploy(&descriptor).await {
            let e = into_deploy_error(&descriptor, e);
            self.emit(WorkflowUpdate::Failed {
                phase: Phase::Deploying,
                message: e.to_string(),
            });
            return Err(e);
        }

        info!("Deploy ok.");
        self.emit(WorkflowUpdate::Deployed {
            descriptor: descriptor.clone(),
        });
        Ok(WorkflowOutcome::Deployed { descriptor })
    }

    /// Build the deployment descriptor from the import result
    fn descriptor(&self, receipt: &ImportReceipt, environment: &str) -> DeploymentDescriptor {
        let basepath = match self.kind {
            ArtifactKind::Proxy => Some(
                self.basepath
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASEPATH.to_string()),
            ),
            ArtifactKind::SharedFlow => {
                if self.basepath.is_some() {
                    warn!("Basepath does not apply to shared flows, ignoring");
                }
                None
            }
        };

        DeploymentDescriptor {
            name: receipt.name.clone(),
            revision: receipt.revision,
            environment: environment.to_string(),
            basepath,
        }
    }
}

/// Classify an import-phase failure, preserving payloads already attached
fn into_import_error(name: &str, e: EdgeError) -> EdgeError {
    match e {
        EdgeError::Import { .. } | EdgeError::Auth(_) | EdgeError::Validation(_) => e,
        other => EdgeError::Import {
            name: name.to_string(),
            detail: other.to_string(),
            partial: None,
        },
    }
}

/// Classify a deploy-phase failure, preserving payloads already attached
fn into_deploy_error(descriptor: &DeploymentDescriptor, e: EdgeError) -> EdgeError {
    match e {
        EdgeError::Deploy { .. } | EdgeError::Auth(_) | EdgeError::Validation(_) => e,
        other => EdgeError::Deploy {
            name: descriptor.name.clone(),
            revision: descriptor.revision,
            environment: descriptor.environment.clone(),
            detail: other.to_string(),
            partial: None,
        },
    }
}
