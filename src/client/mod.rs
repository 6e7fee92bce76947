// Resource client module for edgeops
//
// This module defines the store traits the orchestration core talks to and
// the Org handle an authenticated session exposes. The HTTP implementation
// lives in http.rs; session establishment in session.rs.

pub mod bundle;
pub mod http;
pub mod session;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use session::connect;

/// Deployable artifact kind, resolved once per operation and never
/// re-dispatched mid-flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// API proxy bundle
    Proxy,
    /// Shared-flow bundle
    SharedFlow,
}

impl ArtifactKind {
    /// Management API collection segment for this kind
    pub fn collection(&self) -> &'static str {
        match self {
            ArtifactKind::Proxy => "apis",
            ArtifactKind::SharedFlow => "sharedflows",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Proxy => write!(f, "proxy"),
            ArtifactKind::SharedFlow => write!(f, "sharedflow"),
        }
    }
}

/// Receipt returned by a successful artifact import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReceipt {
    /// Artifact name as recorded by the platform
    pub name: String,
    /// Newly created revision number
    pub revision: u32,
}

/// Descriptor for deploying an imported revision; constructed only after a
/// successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    /// Artifact name
    pub name: String,
    /// Revision to deploy, as returned by the import
    pub revision: u32,
    /// Target environment
    pub environment: String,
    /// URL path prefix; proxies only, absent for shared flows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basepath: Option<String>,
}

/// Store of deployable artifacts (proxies or shared flows)
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// List artifact names in the collection
    async fn list(&self) -> Result<Vec<String>>;

    /// Revision numbers recorded for one artifact, in platform order
    async fn revisions(&self, name: &str) -> Result<Vec<u32>>;

    /// Import a bundle from a source directory, creating a new revision
    async fn import_from_source(&self, name: &str, src_dir: &Path) -> Result<ImportReceipt>;

    /// Deploy a revision per the descriptor
    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<()>;
}

/// Store of key/value maps, organization- or environment-scoped
#[async_trait]
pub trait KvmStore: Send + Sync {
    /// List KVM names visible at the given scope
    async fn list(&self, environment: Option<&str>) -> Result<Vec<String>>;

    /// Create a KVM at the given scope
    async fn create(&self, name: &str, environment: Option<&str>) -> Result<()>;

    /// Delete a KVM at the given scope
    async fn delete(&self, name: &str, environment: Option<&str>) -> Result<()>;
}

/// Store of environments defined on the organization
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// List environment names
    async fn list(&self) -> Result<Vec<String>>;
}

/// Authenticated handle to an organization
///
/// Created once by [`connect`], read-only afterwards; it may be shared
/// freely across independent aggregations and workflows.
#[derive(Clone)]
pub struct Org {
    name: String,
    proxies: Arc<dyn ArtifactStore>,
    sharedflows: Arc<dyn ArtifactStore>,
    kvms: Arc<dyn KvmStore>,
    environments: Arc<dyn EnvironmentStore>,
}

impl Org {
    /// Assemble an organization handle from its sub-collections
    pub fn new(
        name: impl Into<String>,
        proxies: Arc<dyn ArtifactStore>,
        sharedflows: Arc<dyn ArtifactStore>,
        kvms: Arc<dyn KvmStore>,
        environments: Arc<dyn EnvironmentStore>,
    ) -> Self {
        Self {
            name: name.into(),
            proxies,
            sharedflows,
            kvms,
            environments,
        }
    }

    /// Organization name this session is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Proxy collection
    pub fn proxies(&self) -> Arc<dyn ArtifactStore> {
        Arc::clone(&self.proxies)
    }

    /// Shared-flow collection
    pub fn sharedflows(&self) -> Arc<dyn ArtifactStore> {
        Arc::clone(&self.sharedflows)
    }

    /// KVM collection
    pub fn kvms(&self) -> Arc<dyn KvmStore> {
        Arc::clone(&self.kvms)
    }

    /// Environment collection
    pub fn environments(&self) -> Arc<dyn EnvironmentStore> {
        Arc::clone(&self.environments)
    }

    /// Select the artifact collection for a kind
    pub fn artifacts(&self, kind: ArtifactKind) -> Arc<dyn ArtifactStore> {
        match kind {
            ArtifactKind::Proxy => self.proxies(),
            ArtifactKind::SharedFlow => self.sharedflows(),
        }
    }
}

impl std::fmt::Debug for Org {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Org").field("name", &self.name).finish()
    }
}
