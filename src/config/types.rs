// Connection configuration types for edgeops
//
// This module defines the immutable per-invocation configuration consumed by
// Session::connect. There is no process-wide mutable options state; the CLI
// builds one ConnectConfig and hands it over by value.

use serde::{Deserialize, Serialize};

use crate::error::{EdgeError, Result};

/// Default management API endpoint
pub const DEFAULT_MGMT_SERVER: &str = "https://api.enterprise.apigee.com";

/// Default SSO endpoint for the password-grant token exchange
pub const DEFAULT_SSO_ENDPOINT: &str = "https://login.apigee.com/oauth/token";

/// How the session authenticates against the management API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Pre-acquired bearer token; no exchange round trip
    Bearer(String),
    /// Basic auth on every request (token exchange skipped)
    Basic { username: String, password: String },
    /// Exchange username/password for a bearer token at the SSO endpoint
    PasswordGrant { username: String, password: String },
}

/// Immutable connection configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Management API base URL
    pub mgmt_server: String,
    /// Organization the session is bound to
    pub org: String,
    /// Username for basic auth or token exchange
    pub username: Option<String>,
    /// Password for basic auth or token exchange
    pub password: Option<String>,
    /// Pre-acquired bearer token, takes precedence over credentials
    pub token: Option<String>,
    /// Skip the token exchange and use basic auth directly
    pub no_token: bool,
    /// Verbosity level (0 = quiet)
    pub verbosity: u8,
}

impl ConnectConfig {
    /// Create a configuration for the given org with default endpoints
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            mgmt_server: DEFAULT_MGMT_SERVER.to_string(),
            org: org.into(),
            username: None,
            password: None,
            token: None,
            no_token: false,
            verbosity: 0,
        }
    }

    /// Resolve the authentication scheme from the configured fields
    pub fn auth_scheme(&self) -> Result<AuthScheme> {
        if let Some(token) = &self.token {
            return Ok(AuthScheme::Bearer(token.clone()));
        }

        let username = self
            .username
            .clone()
            .ok_or_else(|| EdgeError::Config("missing username".to_string()))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| EdgeError::Config("missing password".to_string()))?;

        if self.no_token {
            Ok(AuthScheme::Basic { username, password })
        } else {
            Ok(AuthScheme::PasswordGrant { username, password })
        }
    }

    /// Validate that the configuration is complete enough to connect
    pub fn validate(&self) -> Result<()> {
        if self.org.trim().is_empty() {
            return Err(EdgeError::Config("missing organization".to_string()));
        }
        if self.mgmt_server.trim().is_empty() {
            return Err(EdgeError::Config("missing management server".to_string()));
        }
        self.auth_scheme().map(|_| ())
    }
}
