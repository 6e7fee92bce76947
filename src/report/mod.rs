// Ordered revision aggregation for edgeops
//
// The aggregator fetches detail for each discovered name strictly one at a
// time: never more than one in-flight request, so the backend is not
// flooded and the report order always matches discovery order. A single
// failed fetch aborts the whole batch; there is no partial-results mode.

use std::future::Future;

use serde::Serialize;
use tracing::debug;

use crate::client::{ArtifactKind, Org};
use crate::error::{EdgeError, Result};

/// One line of the revision report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionEntry {
    /// Artifact name
    pub name: String,
    /// Highest revision number recorded for the artifact
    pub latest_revision: u32,
}

/// Latest revision of a revision sequence: the maximum element, not the
/// last one (the platform does not promise sorted output)
pub fn latest_revision(revisions: &[u32]) -> Option<u32> {
    revisions.iter().copied().max()
}

/// Keep only the names starting with the prefix, preserving order
pub fn filter_by_prefix(names: Vec<String>, prefix: Option<&str>) -> Vec<String> {
    match prefix {
        None => names,
        Some(p) => names.into_iter().filter(|n| n.starts_with(p)).collect(),
    }
}

/// Fold per-name revision fetches into an ordered report
///
/// `fetch_one` is awaited to completion for each name before the next fetch
/// starts. On failure the error names the item that poisoned the batch.
pub async fn aggregate<F, Fut>(names: Vec<String>, mut fetch_one: F) -> Result<Vec<RevisionEntry>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<u32>>>,
{
    let mut report = Vec::with_capacity(names.len());
    for name in names {
        debug!("Fetching revisions for {}", name);
        let revisions = fetch_one(name.clone())
            .await
            .map_err(|e| EdgeError::during_fetch(&name, e))?;
        let latest = latest_revision(&revisions).ok_or_else(|| {
            EdgeError::during_fetch(&name, EdgeError::Remote("no revisions recorded".to_string()))
        })?;
        report.push(RevisionEntry {
            name,
            latest_revision: latest,
        });
    }
    Ok(report)
}

/// List a collection and aggregate its latest revisions, optionally
/// restricted to names starting with `prefix`
pub async fn revision_report(
    org: &Org,
    kind: ArtifactKind,
    prefix: Option<&str>,
) -> Result<Vec<RevisionEntry>> {
    let store = org.artifacts(kind);
    let names = filter_by_prefix(store.list().await?, prefix);
    debug!("Aggregating {} {} name(s)", names.len(), kind);

    aggregate(names, move |name| {
        let store = store.clone();
        async move { store.revisions(&name).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_latest_revision_is_maximum_not_last() {
        assert_eq!(latest_revision(&[1, 2, 5, 3]), Some(5));
        assert_eq!(latest_revision(&[7]), Some(7));
        assert_eq!(latest_revision(&[]), None);
    }

    #[test]
    fn test_prefix_filter_preserves_order() {
        let filtered = filter_by_prefix(
            names(&["payment-api", "refund-api", "payment-core"]),
            Some("payment"),
        );
        assert_eq!(filtered, names(&["payment-api", "payment-core"]));

        let unfiltered = filter_by_prefix(names(&["a", "b"]), None);
        assert_eq!(unfiltered, names(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_aggregate_preserves_input_order() {
        let mut revisions = HashMap::new();
        revisions.insert("beta".to_string(), vec![1, 4, 2]);
        revisions.insert("alpha".to_string(), vec![9]);
        revisions.insert("gamma".to_string(), vec![3, 2]);

        let report = aggregate(names(&["beta", "alpha", "gamma"]), |name| {
            let revisions = revisions.clone();
            async move { Ok(revisions[&name].clone()) }
        })
        .await
        .unwrap();

        let got: Vec<(&str, u32)> = report
            .iter()
            .map(|e| (e.name.as_str(), e.latest_revision))
            .collect();
        assert_eq!(got, vec![("beta", 4), ("alpha", 9), ("gamma", 3)]);
    }

    #[tokio::test]
    async fn test_aggregate_is_strictly_sequential() {
        // Each fetch records start and end; sequencing means the events for
        // one name never interleave with another's.
        let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let report = aggregate(names(&["one", "two", "three"]), |name| {
            let events = Arc::clone(&events);
            async move {
                events.lock().unwrap().push(format!("start {}", name));
                tokio::task::yield_now().await;
                events.lock().unwrap().push(format!("end {}", name));
                Ok(vec![1])
            }
        })
        .await
        .unwrap();

        assert_eq!(report.len(), 3);
        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start one", "end one", "start two", "end two", "start three", "end three"
            ]
        );
    }

    #[tokio::test]
    async fn test_aggregate_aborts_on_first_failure() {
        let fetched: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let err = aggregate(names(&["good", "bad", "never"]), |name| {
            let fetched = Arc::clone(&fetched);
            async move {
                fetched.lock().unwrap().push(name.clone());
                if name == "bad" {
                    Err(EdgeError::Remote("boom".to_string()))
                } else {
                    Ok(vec![1])
                }
            }
        })
        .await
        .unwrap_err();

        // The failure names the poisoning item, and no later name was fetched
        assert_eq!(err.failed_item(), Some("bad"));
        assert_eq!(*fetched.lock().unwrap(), names(&["good", "bad"]));
    }

    #[tokio::test]
    async fn test_aggregate_rejects_empty_revision_list() {
        let err = aggregate(names(&["hollow"]), |_| async { Ok(vec![]) })
            .await
            .unwrap_err();
        assert_eq!(err.failed_item(), Some("hollow"));
    }
}
