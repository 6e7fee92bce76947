// Key/value map operations for edgeops
//
// KVMs are scoped either to the organization or to one environment. Shape
// rules are enforced here, before any remote call: a name is always
// required, and environment existence is the platform's to check.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::Org;
use crate::error::{EdgeError, Result};

/// Scope a KVM request resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvmScope {
    /// Visible organization-wide
    Organization,
    /// Scoped to one named environment
    Environment(String),
}

/// Shape of a KVM create/delete request
///
/// Mirrors the wire shape: both fields optional, with validation deciding
/// what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvmSpec {
    /// KVM name; always required, never empty
    pub name: Option<String>,
    /// Environment; present iff the KVM is environment-scoped
    pub environment: Option<String>,
}

impl KvmSpec {
    /// A spec with only a name (organization scope)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            environment: None,
        }
    }

    /// Scope the spec to an environment
    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Validate the spec and resolve its scope
    ///
    /// A missing or empty name is rejected at any scope without touching
    /// the remote platform.
    pub fn scope(&self) -> Result<KvmScope> {
        match self.name.as_deref() {
            None => Err(EdgeError::Validation(
                "kvm request requires a name".to_string(),
            )),
            Some("") => Err(EdgeError::Validation(
                "kvm name must not be empty".to_string(),
            )),
            Some(_) => Ok(match &self.environment {
                Some(env) => KvmScope::Environment(env.clone()),
                None => KvmScope::Organization,
            }),
        }
    }

    /// The validated name, after `scope()` succeeded
    fn name(&self) -> Result<&str> {
        self.scope()?;
        Ok(self.name.as_deref().unwrap_or_default())
    }
}

/// Create a KVM at the scope the spec resolves to
pub async fn create(org: &Org, spec: &KvmSpec) -> Result<()> {
    let scope = spec.scope()?;
    let name = spec.name()?;

    match &scope {
        KvmScope::Organization => {
            debug!("Creating org-scoped kvm {}", name);
            org.kvms().create(name, None).await?;
        }
        KvmScope::Environment(env) => {
            debug!("Creating kvm {} in environment {}", name, env);
            org.kvms().create(name, Some(env)).await?;
        }
    }
    info!("Created kvm {}", name);
    Ok(())
}

/// Delete a KVM at the scope the spec resolves to
pub async fn delete(org: &Org, spec: &KvmSpec) -> Result<()> {
    let scope = spec.scope()?;
    let name = spec.name()?;

    match &scope {
        KvmScope::Organization => {
            debug!("Deleting org-scoped kvm {}", name);
            org.kvms().delete(name, None).await?;
        }
        KvmScope::Environment(env) => {
            debug!("Deleting kvm {} from environment {}", name, env);
            org.kvms().delete(name, Some(env)).await?;
        }
    }
    info!("Deleted kvm {}", name);
    Ok(())
}

/// List KVM names visible in an environment
///
/// An organization-wide listing requires a name filter the platform does
/// not offer, so a missing environment is rejected here.
pub async fn list(org: &Org, environment: Option<&str>) -> Result<Vec<String>> {
    let Some(env) = environment else {
        return Err(EdgeError::Validation(
            "listing kvms requires an environment".to_string(),
        ));
    };
    org.kvms().list(Some(env)).await
}
