// Integration tests for edgeops
//
// These drive the public API end to end against in-memory resource stores:
// ordered revision aggregation, the import-deploy workflow, and KVM scope
// validation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use edgeops::client::{ArtifactStore, EnvironmentStore, KvmStore};
use edgeops::workflow::Phase;
use edgeops::{
    kvm, report, ArtifactKind, DeploymentDescriptor, EdgeError, ImportDeploy, ImportReceipt,
    KvmSpec, Org, Result,
};

/// In-memory artifact store with per-name revision lists and a call log
struct FakeArtifacts {
    names: Vec<String>,
    revisions: HashMap<String, Vec<u32>>,
    failing: Option<String>,
    log: Mutex<Vec<String>>,
}

impl FakeArtifacts {
    fn new(entries: &[(&str, &[u32])]) -> Self {
        Self {
            names: entries.iter().map(|(n, _)| n.to_string()).collect(),
            revisions: entries
                .iter()
                .map(|(n, r)| (n.to_string(), r.to_vec()))
                .collect(),
            failing: None,
            log: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, name: &str) -> Self {
        self.failing = Some(name.to_string());
        self
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for FakeArtifacts {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    async fn revisions(&self, name: &str) -> Result<Vec<u32>> {
        self.log.lock().unwrap().push(name.to_string());
        if self.failing.as_deref() == Some(name) {
            return Err(EdgeError::Remote("internal error".to_string()));
        }
        self.revisions
            .get(name)
            .cloned()
            .ok_or_else(|| EdgeError::NotFound(name.to_string()))
    }

    async fn import_from_source(&self, name: &str, _src_dir: &Path) -> Result<ImportReceipt> {
        let next = self
            .revisions
            .get(name)
            .and_then(|r| r.iter().max())
            .copied()
            .unwrap_or(0)
            + 1;
        Ok(ImportReceipt {
            name: name.to_string(),
            revision: next,
        })
    }

    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("deploy:{}:{}", descriptor.name, descriptor.revision));
        Ok(())
    }
}

/// In-memory KVM store seeded the way a test organization would be
struct FakeKvms {
    entries: Mutex<Vec<(Option<String>, String)>>,
}

impl FakeKvms {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl KvmStore for FakeKvms {
    async fn list(&self, environment: Option<&str>) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(env, _)| env.as_deref() == environment)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn create(&self, name: &str, environment: Option<&str>) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .push((environment.map(String::from), name.to_string()));
        Ok(())
    }

    async fn delete(&self, name: &str, environment: Option<&str>) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(env, n)| !(env.as_deref() == environment && n == name));
        if entries.len() == before {
            return Err(EdgeError::NotFound(format!("kvm {}", name)));
        }
        Ok(())
    }
}

struct FakeEnvironments;

#[async_trait]
impl EnvironmentStore for FakeEnvironments {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(vec!["test".to_string(), "prod".to_string()])
    }
}

fn org_with_artifacts(artifacts: Arc<FakeArtifacts>) -> Org {
    Org::new(
        "integration-org",
        artifacts.clone(),
        artifacts,
        Arc::new(FakeKvms::new()),
        Arc::new(FakeEnvironments),
    )
}

#[tokio::test]
async fn test_revision_report_order_matches_discovery_order() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[
        ("zeta", &[1, 2]),
        ("alpha", &[1, 2, 5, 3]),
        ("mid", &[4]),
    ]));
    let org = org_with_artifacts(artifacts);

    let entries = report::revision_report(&org, ArtifactKind::Proxy, None).await?;
    let got: Vec<(&str, u32)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.latest_revision))
        .collect();
    // Discovery order, and latest = maximum (not last) revision
    assert_eq!(got, vec![("zeta", 2), ("alpha", 5), ("mid", 4)]);
    Ok(())
}

#[tokio::test]
async fn test_revision_report_prefix_scenario() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[
        ("payment-api", &[1]),
        ("payment-core", &[2]),
        ("refund-api", &[3]),
    ]));
    let org = org_with_artifacts(artifacts.clone());

    let entries = report::revision_report(&org, ArtifactKind::Proxy, Some("payment")).await?;
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["payment-api", "payment-core"]);
    // refund-api was filtered out before aggregation began
    assert_eq!(artifacts.log(), vec!["payment-api", "payment-core"]);
    Ok(())
}

#[tokio::test]
async fn test_revision_report_aborts_without_partial_results() {
    let artifacts = Arc::new(
        FakeArtifacts::new(&[("first", &[1]), ("broken", &[2]), ("after", &[3])])
            .failing_on("broken"),
    );
    let org = org_with_artifacts(artifacts.clone());

    let err = report::revision_report(&org, ArtifactKind::Proxy, None)
        .await
        .unwrap_err();
    assert_eq!(err.failed_item(), Some("broken"));
    // Nothing past the failing name was fetched
    assert_eq!(artifacts.log(), vec!["first", "broken"]);
}

#[tokio::test]
async fn test_import_deploy_end_to_end() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[("orders", &[1, 2])]));
    let org = org_with_artifacts(artifacts.clone());

    let outcome = ImportDeploy::new(ArtifactKind::Proxy, "orders", "/tmp/bundle")
        .deploy_to("test")
        .run(&org)
        .await?;

    assert_eq!(outcome.terminal_phase(), Phase::Deployed);
    // Deploy used the revision the import produced (max + 1 in the fake)
    assert!(artifacts.log().contains(&"deploy:orders:3".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_import_without_target_skips_quietly() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[("orders", &[1])]));
    let org = org_with_artifacts(artifacts.clone());

    let outcome = ImportDeploy::new(ArtifactKind::SharedFlow, "orders", "/tmp/bundle")
        .run(&org)
        .await?;

    assert_eq!(outcome.terminal_phase(), Phase::Skipped);
    assert!(artifacts.log().iter().all(|l| !l.starts_with("deploy")));
    Ok(())
}

#[tokio::test]
async fn test_kvm_created_in_each_environment() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[]));
    let org = org_with_artifacts(artifacts);

    for env in org.environments().list().await? {
        kvm::create(&org, &KvmSpec::named("shared-settings").in_environment(&env)).await?;
        assert_eq!(
            kvm::list(&org, Some(&env)).await?,
            vec!["shared-settings".to_string()]
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_kvm_scope_rules() -> Result<()> {
    let artifacts = Arc::new(FakeArtifacts::new(&[]));
    let org = org_with_artifacts(artifacts);

    // No name fails at any scope, before any remote call
    assert!(matches!(
        kvm::create(&org, &KvmSpec::default()).await,
        Err(EdgeError::Validation(_))
    ));

    // Name without environment: org-scoped, valid
    kvm::create(&org, &KvmSpec::named("settings")).await?;

    // Name with environment: environment-scoped, valid
    kvm::create(&org, &KvmSpec::named("settings").in_environment("test")).await?;
    assert_eq!(
        kvm::list(&org, Some("test")).await?,
        vec!["settings".to_string()]
    );

    // Deleting with no name fails; deleting a missing name is NotFound
    assert!(matches!(
        kvm::delete(&org, &KvmSpec::default()).await,
        Err(EdgeError::Validation(_))
    ));
    assert!(matches!(
        kvm::delete(&org, &KvmSpec::named("nonexistent")).await,
        Err(EdgeError::NotFound(_))
    ));

    kvm::delete(&org, &KvmSpec::named("settings")).await?;
    Ok(())
}
