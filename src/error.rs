// Error taxonomy for edgeops
//
// Every remote operation is independently failable; errors propagate upward
// unmodified, carrying whatever diagnostic payload the platform returned.
// Retry policy belongs to the invoking shell, never to this crate.

use thiserror::Error;

/// Errors produced by edgeops operations
#[derive(Error, Debug)]
pub enum EdgeError {
    /// Session establishment failed; fatal, never retried internally
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Malformed request detected before any remote call (e.g. empty name)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Get/delete on a resource the platform does not know about
    #[error("not found: {0}")]
    NotFound(String),

    /// Platform-side rejection (e.g. unknown environment)
    #[error("platform rejected request: {0}")]
    Remote(String),

    /// Import phase of the import-deploy workflow failed
    #[error("import of {name} failed: {detail}")]
    Import {
        name: String,
        detail: String,
        /// Partial result payload returned by the failed call, if any
        partial: Option<serde_json::Value>,
    },

    /// Deploy phase of the import-deploy workflow failed
    #[error("deploy of {name} r{revision} to {environment} failed: {detail}")]
    Deploy {
        name: String,
        revision: u32,
        environment: String,
        detail: String,
        partial: Option<serde_json::Value>,
    },

    /// A single fetch inside an ordered aggregation failed; the whole batch
    /// aborts and this records which name poisoned it
    #[error("aggregation aborted: fetch of {name} failed: {source}")]
    Fetch {
        name: String,
        #[source]
        source: Box<EdgeError>,
    },

    #[error("bundle packaging failed: {0}")]
    Bundle(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EdgeError {
    /// Wrap an error as an aggregation failure for the given item name
    pub fn during_fetch(name: impl Into<String>, source: EdgeError) -> Self {
        EdgeError::Fetch {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// The name of the item whose fetch poisoned an aggregation, if this
    /// error came out of the ordered aggregator
    pub fn failed_item(&self) -> Option<&str> {
        match self {
            EdgeError::Fetch { name, .. } => Some(name),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EdgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_failing_item() {
        let err = EdgeError::during_fetch("payment-api", EdgeError::Remote("boom".to_string()));
        assert_eq!(err.failed_item(), Some("payment-api"));
        assert!(err.to_string().contains("payment-api"));
    }

    #[test]
    fn test_non_fetch_error_has_no_item() {
        let err = EdgeError::Validation("missing name".to_string());
        assert_eq!(err.failed_item(), None);
    }

    #[test]
    fn test_import_error_message_carries_detail() {
        let err = EdgeError::Import {
            name: "orders-v1".to_string(),
            detail: "bundle rejected".to_string(),
            partial: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("orders-v1"));
        assert!(msg.contains("bundle rejected"));
    }
}
