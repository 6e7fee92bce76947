// Session establishment for edgeops
//
// connect performs exactly one authentication round trip (a token exchange
// when credentials are supplied, otherwise a probe of the organization) and
// returns an Org handle bound to the organization. Failures surface
// unchanged; retry policy belongs to the caller.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::http::{HttpArtifactStore, HttpEnvironmentStore, HttpKvmStore, RequestAuth, Transport};
use super::{ArtifactKind, Org};
use crate::config::{AuthScheme, ConnectConfig, DEFAULT_SSO_ENDPOINT};
use crate::error::{EdgeError, Result};

// Fixed client pair the platform SSO accepts for password-grant exchanges
const SSO_CLIENT_ID: &str = "edgecli";
const SSO_CLIENT_SECRET: &str = "edgeclisecret";

/// Bearer token obtained from the SSO endpoint, with its expiry
#[derive(Debug, Clone)]
pub struct TokenState {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Refuse a token the SSO already considers expired; a session built on
/// one would fail every request with a misleading authorization error
fn ensure_live(token: TokenState) -> Result<TokenState> {
    if token.is_expired() {
        return Err(EdgeError::Auth(format!(
            "token exchange returned a token that expired at {}",
            token.expires_at
        )));
    }
    Ok(token)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Establish an authenticated session against the management API
pub async fn connect(config: ConnectConfig) -> Result<Org> {
    config.validate()?;
    debug!(
        "Connecting to {} as organization {}",
        config.mgmt_server, config.org
    );

    let http = Client::new();
    let auth = match config.auth_scheme()? {
        AuthScheme::Bearer(token) => RequestAuth::Bearer(token),
        AuthScheme::Basic { username, password } => RequestAuth::Basic { username, password },
        AuthScheme::PasswordGrant { username, password } => {
            let token = ensure_live(exchange_token(&http, &username, &password).await?)?;
            debug!("Token valid until {}", token.expires_at);
            RequestAuth::Bearer(token.access_token)
        }
    };

    let transport = Arc::new(Transport::new(http, &config.mgmt_server, &config.org, auth));
    transport.verify_org().await?;
    info!("Connected to organization {}", config.org);

    Ok(Org::new(
        &config.org,
        Arc::new(HttpArtifactStore::new(
            Arc::clone(&transport),
            ArtifactKind::Proxy,
        )),
        Arc::new(HttpArtifactStore::new(
            Arc::clone(&transport),
            ArtifactKind::SharedFlow,
        )),
        Arc::new(HttpKvmStore::new(Arc::clone(&transport))),
        Arc::new(HttpEnvironmentStore::new(transport)),
    ))
}

/// Exchange username/password for a bearer token at the SSO endpoint
async fn exchange_token(http: &Client, username: &str, password: &str) -> Result<TokenState> {
    debug!("Exchanging credentials for a token at {}", DEFAULT_SSO_ENDPOINT);

    let response = http
        .post(DEFAULT_SSO_ENDPOINT)
        .basic_auth(SSO_CLIENT_ID, Some(SSO_CLIENT_SECRET))
        .form(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ])
        .send()
        .await
        .map_err(|e| EdgeError::Auth(format!("token exchange failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EdgeError::Auth(format!(
            "token exchange rejected ({}): {}",
            status, body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| EdgeError::Auth(format!("malformed token response: {}", e)))?;

    Ok(TokenState {
        access_token: token.access_token,
        // The SSO default lifetime applies when the response omits one
        expires_at: Utc::now() + Duration::seconds(token.expires_in.unwrap_or(1799)),
    })
}
