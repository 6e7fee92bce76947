// HTTP resource stores backed by the Edge management API
//
// One Transport is shared by all stores of a session; it owns the reqwest
// client, the base URL, and the credentials attached to every request.
// Status codes map onto the crate's error taxonomy here and nowhere else.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{bundle, ArtifactKind, ArtifactStore, DeploymentDescriptor, EnvironmentStore, ImportReceipt, KvmStore};
use crate::error::{EdgeError, Result};

/// Credentials attached to every management API request
#[derive(Debug, Clone)]
pub enum RequestAuth {
    Bearer(String),
    Basic { username: String, password: String },
}

/// Shared transport for the HTTP stores of one session
pub struct Transport {
    http: Client,
    base_url: String,
    org: String,
    auth: RequestAuth,
}

impl Transport {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        org: impl Into<String>,
        auth: RequestAuth,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            org: org.into(),
            auth,
        }
    }

    /// URL of the organization itself
    fn org_url(&self) -> String {
        format!("{}/v1/organizations/{}", self.base_url, self.org)
    }

    /// URL of a path under the organization
    fn url(&self, tail: &str) -> String {
        format!("{}/{}", self.org_url(), tail)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            RequestAuth::Bearer(token) => request.bearer_auth(token),
            RequestAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
        }
    }

    /// Map a non-success response onto the error taxonomy
    async fn check(&self, response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{} failed with {}: {}", context, status, body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(EdgeError::Auth(format!("{}: {}", context, body)))
            }
            StatusCode::NOT_FOUND => Err(EdgeError::NotFound(format!("{}: {}", context, body))),
            _ => Err(EdgeError::Remote(format!(
                "{} ({}): {}",
                context, status, body
            ))),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, tail: &str) -> Result<T> {
        let url = self.url(tail);
        debug!("GET {}", url);
        let response = self.authorize(self.http.get(&url)).send().await?;
        let response = self.check(response, &format!("GET {}", tail)).await?;
        Ok(response.json().await?)
    }

    /// Confirm the session can see the organization; the one authentication
    /// round trip performed by connect when no token exchange is needed
    pub async fn verify_org(&self) -> Result<()> {
        let url = self.org_url();
        debug!("GET {}", url);
        let response = self.authorize(self.http.get(&url)).send().await?;
        self.check(response, &format!("GET organization {}", self.org))
            .await?;
        Ok(())
    }
}

/// Revision numbers come back from the platform as decimal strings
fn parse_revision(raw: &str, name: &str) -> Result<u32> {
    raw.parse::<u32>().map_err(|_| {
        EdgeError::Remote(format!("unparseable revision {:?} for {}", raw, name))
    })
}

/// Artifact detail as returned by the management API
#[derive(Debug, Deserialize)]
struct ArtifactDetail {
    #[serde(default)]
    revision: Vec<String>,
}

/// Import response as returned by the management API
#[derive(Debug, Deserialize)]
struct ImportResponse {
    name: String,
    revision: String,
}

/// HTTP-backed artifact store for one collection (proxies or shared flows)
pub struct HttpArtifactStore {
    transport: Arc<Transport>,
    kind: ArtifactKind,
}

impl HttpArtifactStore {
    pub fn new(transport: Arc<Transport>, kind: ArtifactKind) -> Self {
        Self { transport, kind }
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn list(&self) -> Result<Vec<String>> {
        self.transport.get_json(self.kind.collection()).await
    }

    async fn revisions(&self, name: &str) -> Result<Vec<u32>> {
        let tail = format!("{}/{}", self.kind.collection(), name);
        let detail: ArtifactDetail = self.transport.get_json(&tail).await?;
        detail
            .revision
            .iter()
            .map(|raw| parse_revision(raw, name))
            .collect()
    }

    async fn import_from_source(&self, name: &str, src_dir: &Path) -> Result<ImportReceipt> {
        let archive = bundle::package_dir(src_dir)?;
        let url = format!(
            "{}?action=import&name={}",
            self.transport.url(self.kind.collection()),
            name
        );
        debug!("POST {}", url);

        let response = self
            .transport
            .authorize(self.transport.http.post(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(archive)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(EdgeError::Auth(format!("import of {}: {}", name, body)));
            }
            // Keep whatever payload the platform returned alongside the error
            return Err(EdgeError::Import {
                name: name.to_string(),
                detail: format!("{}: {}", status, body),
                partial: serde_json::from_str(&body).ok(),
            });
        }

        let imported: ImportResponse = response.json().await?;
        let revision = parse_revision(&imported.revision, &imported.name)?;
        Ok(ImportReceipt {
            name: imported.name,
            revision,
        })
    }

    async fn deploy(&self, descriptor: &DeploymentDescriptor) -> Result<()> {
        let tail = format!(
            "environments/{}/{}/{}/revisions/{}/deployments",
            descriptor.environment,
            self.kind.collection(),
            descriptor.name,
            descriptor.revision
        );
        let url = self.transport.url(&tail);
        debug!("POST {}", url);

        let mut form: Vec<(&str, String)> = vec![("override", "true".to_string())];
        if let Some(basepath) = &descriptor.basepath {
            form.push(("basepath", basepath.clone()));
        }

        let response = self
            .transport
            .authorize(self.transport.http.post(&url))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(EdgeError::Auth(format!(
                    "deploy of {}: {}",
                    descriptor.name, body
                )));
            }
            return Err(EdgeError::Deploy {
                name: descriptor.name.clone(),
                revision: descriptor.revision,
                environment: descriptor.environment.clone(),
                detail: format!("{}: {}", status, body),
                partial: serde_json::from_str(&body).ok(),
            });
        }
        Ok(())
    }
}

/// HTTP-backed KVM store
pub struct HttpKvmStore {
    transport: Arc<Transport>,
}

impl HttpKvmStore {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Path of the KVM collection at the given scope
    fn collection_tail(environment: Option<&str>) -> String {
        match environment {
            Some(env) => format!("environments/{}/keyvaluemaps", env),
            None => "keyvaluemaps".to_string(),
        }
    }
}

#[async_trait]
impl KvmStore for HttpKvmStore {
    async fn list(&self, environment: Option<&str>) -> Result<Vec<String>> {
        self.transport
            .get_json(&Self::collection_tail(environment))
            .await
    }

    async fn create(&self, name: &str, environment: Option<&str>) -> Result<()> {
        let tail = Self::collection_tail(environment);
        let url = self.transport.url(&tail);
        debug!("POST {}", url);

        let body = serde_json::json!({ "name": name, "entry": [] });
        let response = self
            .transport
            .authorize(self.transport.http.post(&url))
            .json(&body)
            .send()
            .await?;
        self.transport
            .check(response, &format!("create kvm {}", name))
            .await?;
        Ok(())
    }

    async fn delete(&self, name: &str, environment: Option<&str>) -> Result<()> {
        let tail = format!("{}/{}", Self::collection_tail(environment), name);
        let url = self.transport.url(&tail);
        debug!("DELETE {}", url);

        let response = self
            .transport
            .authorize(self.transport.http.delete(&url))
            .send()
            .await?;
        self.transport
            .check(response, &format!("delete kvm {}", name))
            .await?;
        Ok(())
    }
}

/// HTTP-backed environment store
pub struct HttpEnvironmentStore {
    transport: Arc<Transport>,
}

impl HttpEnvironmentStore {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl EnvironmentStore for HttpEnvironmentStore {
    async fn list(&self) -> Result<Vec<String>> {
        self.transport.get_json("environments").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> Transport {
        Transport::new(
            Client::new(),
            base,
            "test-org",
            RequestAuth::Bearer("tok".to_string()),
        )
    }

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let t = transport("https://mgmt.example.com/");
        assert_eq!(
            t.url("apis"),
            "https://mgmt.example.com/v1/organizations/test-org/apis"
        );
    }

    #[test]
    fn test_kvm_collection_tails() {
        assert_eq!(HttpKvmStore::collection_tail(None), "keyvaluemaps");
        assert_eq!(
            HttpKvmStore::collection_tail(Some("prod")),
            "environments/prod/keyvaluemaps"
        );
    }

    #[test]
    fn test_parse_revision() {
        assert_eq!(parse_revision("12", "orders").unwrap(), 12);
        assert!(parse_revision("twelve", "orders").is_err());
    }

    #[test]
    fn test_artifact_detail_revision_strings() {
        let detail: ArtifactDetail =
            serde_json::from_str(r#"{"name":"orders","revision":["1","2","5","3"]}"#).unwrap();
        assert_eq!(detail.revision, vec!["1", "2", "5", "3"]);
    }
}
