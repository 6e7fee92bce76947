//! edgeops Library
//!
//! This library provides the orchestration core for lifecycle operations
//! against an Apigee Edge organization: session establishment, ordered
//! revision aggregation, the import-deploy workflow, and scope-validated
//! KVM management.

pub mod client;
pub mod config;
pub mod error;
pub mod kvm;
pub mod report;
pub mod workflow;

// Re-export main types for convenience
pub use client::{connect, ArtifactKind, DeploymentDescriptor, ImportReceipt, Org};
pub use config::ConnectConfig;
pub use error::{EdgeError, Result};
pub use kvm::KvmSpec;
pub use report::RevisionEntry;
pub use workflow::ImportDeploy;
