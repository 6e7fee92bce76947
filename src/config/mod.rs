// Configuration module for edgeops
//
// Connection settings are assembled once per invocation into an immutable
// ConnectConfig and passed by value into the session and workflows.

pub mod file;
pub mod types;

// Re-export commonly used types
pub use file::FileConfig;
pub use types::{AuthScheme, ConnectConfig, DEFAULT_MGMT_SERVER, DEFAULT_SSO_ENDPOINT};
