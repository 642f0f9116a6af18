//! Aggregator
//!
//! One aggregation pass: fetch the catalog, list every eligible kind
//! concurrently, and merge the per-kind summaries.
//!
//! Tasks share a single accumulator behind one mutex, held only for the
//! append. A kind that fails, times out or panics is logged and left out;
//! only a catalog failure fails the pass.

use super::discovery::CatalogSource;
use super::error::{DiscoveryError, KindListError};
use super::identity::{resolve, GroupVersionResource, ResourceKindList};
use super::lister::{ObjectLister, ObjectRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Default bound on a single list call
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a whole pass
pub const DEFAULT_PASS_DEADLINE: Duration = Duration::from_secs(120);

/// How many list calls may be in flight at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyLimit {
    /// One task per kind, all in flight together
    #[default]
    Unbounded,
    Bounded(NonZeroUsize),
}

impl ConcurrencyLimit {
    /// `None` or `0` means unbounded
    pub fn from_max(max: Option<usize>) -> Self {
        max.and_then(NonZeroUsize::new)
            .map(Self::Bounded)
            .unwrap_or(Self::Unbounded)
    }
}

/// Tuning for an aggregation pass
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub concurrency: ConcurrencyLimit,
    /// Bound on each list call; `None` waits forever
    pub list_timeout: Option<Duration>,
    /// Bound on the whole pass; unfinished kinds are dropped when it expires
    pub pass_deadline: Option<Duration>,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyLimit::Unbounded,
            list_timeout: Some(DEFAULT_LIST_TIMEOUT),
            pass_deadline: Some(DEFAULT_PASS_DEADLINE),
        }
    }
}

/// Objects found for one kind
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub resource_name: String,
    pub group: String,
    pub version: String,
    pub names: Vec<String>,
    /// Labels by object name, for objects that carry labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, BTreeMap<String, String>>,
}

impl ResourceSummary {
    pub fn from_objects(gvr: &GroupVersionResource, objects: Vec<ObjectRef>) -> Self {
        let mut names = Vec::with_capacity(objects.len());
        let mut labels = BTreeMap::new();
        for object in objects {
            if let Some(object_labels) = object.labels {
                labels.insert(object.name.clone(), object_labels);
            }
            names.push(object.name);
        }

        Self {
            resource_name: gvr.resource.clone(),
            group: gvr.group.clone(),
            version: gvr.version.clone(),
            names,
            labels,
        }
    }
}

/// All summaries of one pass. Order carries no meaning; equality is set equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregationResult {
    summaries: Vec<ResourceSummary>,
}

impl AggregationResult {
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceSummary> {
        self.summaries.iter()
    }

    /// Summary for a resource name, if it was listed
    pub fn get(&self, group: &str, resource_name: &str) -> Option<&ResourceSummary> {
        self.summaries
            .iter()
            .find(|s| s.group == group && s.resource_name == resource_name)
    }

    /// Summaries in a stable order (group, version, resource)
    pub fn into_sorted(mut self) -> Vec<ResourceSummary> {
        self.summaries.sort_by(|a, b| {
            (&a.group, &a.version, &a.resource_name).cmp(&(&b.group, &b.version, &b.resource_name))
        });
        self.summaries
    }
}

impl From<Vec<ResourceSummary>> for AggregationResult {
    fn from(summaries: Vec<ResourceSummary>) -> Self {
        Self { summaries }
    }
}

impl PartialEq for AggregationResult {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut left = self.summaries.clone();
        let mut right = other.summaries.clone();
        left.sort();
        right.sort();
        left == right
    }
}

impl Eq for AggregationResult {}

impl<'a> IntoIterator for &'a AggregationResult {
    type Item = &'a ResourceSummary;
    type IntoIter = std::slice::Iter<'a, ResourceSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Flatten the catalog into the kinds a pass lists
///
/// Sub-resources are dropped, identities are resolved (unresolvable kinds
/// are logged and dropped) and duplicates are listed once.
pub fn eligible_kinds(catalog: &[ResourceKindList]) -> Vec<GroupVersionResource> {
    let mut seen = HashSet::new();
    let mut kinds = Vec::new();

    for list in catalog {
        for kind in &list.resources {
            if kind.is_sub_resource() {
                continue;
            }
            match resolve(&list.group_version, kind) {
                Ok(gvr) => {
                    if seen.insert(gvr.clone()) {
                        kinds.push(gvr);
                    }
                }
                Err(err) => tracing::warn!("Skipping kind: {}", err),
            }
        }
    }

    kinds
}

/// Runs aggregation passes against a catalog source and an object lister
#[derive(Clone)]
pub struct Aggregator {
    catalog: Arc<dyn CatalogSource>,
    lister: Arc<dyn ObjectLister>,
    options: AggregatorOptions,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        lister: Arc<dyn ObjectLister>,
        options: AggregatorOptions,
    ) -> Self {
        Self {
            catalog,
            lister,
            options,
        }
    }

    /// Run one pass
    ///
    /// Fails only when the catalog cannot be fetched; per-kind failures
    /// shrink the result instead.
    pub async fn aggregate(&self) -> Result<AggregationResult, DiscoveryError> {
        let started = Instant::now();
        let deadline = self.options.pass_deadline.map(|d| started + d);

        let catalog = match deadline {
            Some(deadline) => tokio::time::timeout_at(
                deadline,
                self.catalog.server_preferred_resources(),
            )
            .await
            .map_err(|_| DiscoveryError::TimedOut {
                after: started.elapsed(),
            })??,
            None => self.catalog.server_preferred_resources().await?,
        };

        let kinds = eligible_kinds(&catalog);
        tracing::debug!("Listing {} kinds ({:?})", kinds.len(), self.options.concurrency);

        let accumulator = Arc::new(Mutex::new(Vec::with_capacity(kinds.len())));
        let permits = match self.options.concurrency {
            ConcurrencyLimit::Unbounded => None,
            ConcurrencyLimit::Bounded(max) => Some(Arc::new(Semaphore::new(max.get()))),
        };

        let mut tasks = JoinSet::new();
        for gvr in kinds {
            let lister = Arc::clone(&self.lister);
            let accumulator = Arc::clone(&accumulator);
            let permits = permits.clone();
            let list_timeout = self.options.list_timeout;

            tasks.spawn(async move {
                let _permit = match permits {
                    Some(permits) => match permits.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(_) => return,
                    },
                    None => None,
                };

                match list_kind(lister.as_ref(), &gvr, list_timeout).await {
                    Ok(objects) => {
                        let summary = ResourceSummary::from_objects(&gvr, objects);
                        accumulator.lock().await.push(summary);
                    }
                    Err(err) => tracing::warn!("Error listing {}: {}", gvr.resource, err),
                }
            });
        }

        let launched = tasks.len();
        match deadline {
            Some(deadline) => {
                if tokio::time::timeout_at(deadline, drain(&mut tasks))
                    .await
                    .is_err()
                {
                    let unfinished = tasks.len();
                    tasks.shutdown().await;
                    tracing::warn!(
                        "Pass deadline reached after {:?}; dropped {} of {} kinds still listing",
                        started.elapsed(),
                        unfinished,
                        launched
                    );
                }
            }
            None => drain(&mut tasks).await,
        }

        let summaries = std::mem::take(&mut *accumulator.lock().await);
        tracing::info!(
            "Aggregated {} of {} kinds in {:?}",
            summaries.len(),
            launched,
            started.elapsed()
        );

        Ok(AggregationResult::from(summaries))
    }
}

async fn list_kind(
    lister: &dyn ObjectLister,
    gvr: &GroupVersionResource,
    list_timeout: Option<Duration>,
) -> Result<Vec<ObjectRef>, KindListError> {
    match list_timeout {
        Some(after) => tokio::time::timeout(after, lister.list_objects(gvr))
            .await
            .map_err(|_| KindListError::TimedOut {
                resource: gvr.to_string(),
                after,
            })?,
        None => lister.list_objects(gvr).await,
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            if err.is_panic() {
                tracing::error!("List task panicked: {}", err);
            }
        }
    }
}
