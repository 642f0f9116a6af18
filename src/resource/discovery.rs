//! Discovery Enumerator
//!
//! Builds the catalog of resource kinds from the API server's discovery
//! endpoints. Every advertised version of every group is read; each
//! resource of a group is kept once, under the preferred version when that
//! version serves it and otherwise under the first version that does.

use super::error::DiscoveryError;
use super::identity::{ResourceKind, ResourceKindList};
use crate::cluster::ClusterClient;
use async_trait::async_trait;
use futures::future::try_join_all;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use std::collections::HashSet;

#[cfg(test)]
use mockall::automock;

/// Source of the discovery catalog. Queried fresh on every pass.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Kinds of every group, each under its preferred serving version
    async fn server_preferred_resources(&self) -> Result<Vec<ResourceKindList>, DiscoveryError>;
}

/// The versions one group advertises
#[derive(Debug, Clone, PartialEq, Eq)]
struct AdvertisedGroup {
    name: String,
    preferred: Option<String>,
    /// Group/version strings in the server's order
    versions: Vec<String>,
}

impl AdvertisedGroup {
    fn is_core(&self) -> bool {
        self.name.is_empty()
    }

    /// Preferred version first, then the rest as advertised
    fn walk_order(&self) -> Vec<String> {
        let preferred = self.preferred.iter();
        let rest = self
            .versions
            .iter()
            .filter(|gv| Some(*gv) != self.preferred.as_ref());
        preferred.chain(rest).cloned().collect()
    }
}

/// Keep each resource name once, from the first document that serves it.
/// `documents` are one group's lists in walk order; lists left empty are dropped.
fn prefer_versions(documents: Vec<ResourceKindList>) -> Vec<ResourceKindList> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter_map(|mut list| {
            list.resources.retain(|kind| seen.insert(kind.name.clone()));
            (!list.resources.is_empty()).then_some(list)
        })
        .collect()
}

impl From<APIResource> for ResourceKind {
    fn from(resource: APIResource) -> Self {
        Self {
            name: resource.name,
            version: resource.version.unwrap_or_default(),
        }
    }
}

impl From<APIResourceList> for ResourceKindList {
    fn from(list: APIResourceList) -> Self {
        Self {
            group_version: list.group_version,
            resources: list.resources.into_iter().map(ResourceKind::from).collect(),
        }
    }
}

fn discovery_error(endpoint: String, err: kube::Error) -> DiscoveryError {
    match err {
        kube::Error::SerdeError(source) => DiscoveryError::Malformed { endpoint, source },
        other => DiscoveryError::Unreachable {
            endpoint,
            source: other.into(),
        },
    }
}

impl ClusterClient {
    /// `GET /api` and `GET /apis`, with the legacy core group named `""`
    async fn advertised_groups(&self) -> Result<Vec<AdvertisedGroup>, DiscoveryError> {
        let core = self
            .kube()
            .list_core_api_versions()
            .await
            .map_err(|e| discovery_error("/api".to_string(), e))?;
        let groups = self
            .kube()
            .list_api_groups()
            .await
            .map_err(|e| discovery_error("/apis".to_string(), e))?;

        let mut advertised = vec![AdvertisedGroup {
            name: String::new(),
            preferred: core.versions.first().cloned(),
            versions: core.versions,
        }];

        for group in groups.groups {
            let preferred = group
                .preferred_version
                .map(|v| v.group_version)
                .filter(|gv| !gv.is_empty());
            let versions: Vec<String> = group
                .versions
                .into_iter()
                .map(|v| v.group_version)
                .filter(|gv| !gv.is_empty())
                .collect();
            if preferred.is_none() && versions.is_empty() {
                tracing::warn!("API group {} advertises no versions, skipping", group.name);
                continue;
            }
            advertised.push(AdvertisedGroup {
                name: group.name,
                preferred,
                versions,
            });
        }

        Ok(advertised)
    }

    /// `GET /api/{version}` or `GET /apis/{group}/{version}`
    async fn resource_kinds(
        &self,
        group_version: String,
        core: bool,
    ) -> Result<ResourceKindList, DiscoveryError> {
        let (endpoint, response) = if core {
            (
                format!("/api/{group_version}"),
                self.kube().list_core_api_resources(&group_version).await,
            )
        } else {
            (
                format!("/apis/{group_version}"),
                self.kube().list_api_group_resources(&group_version).await,
            )
        };
        response
            .map(ResourceKindList::from)
            .map_err(|e| discovery_error(endpoint, e))
    }
}

#[async_trait]
impl CatalogSource for ClusterClient {
    async fn server_preferred_resources(&self) -> Result<Vec<ResourceKindList>, DiscoveryError> {
        let groups = self.advertised_groups().await?;

        tracing::debug!(
            "Fetching {} discovery documents",
            groups.iter().map(|g| g.walk_order().len()).sum::<usize>()
        );

        let per_group = try_join_all(groups.iter().map(|group| {
            let core = group.is_core();
            try_join_all(
                group
                    .walk_order()
                    .into_iter()
                    .map(move |gv| self.resource_kinds(gv, core)),
            )
        }))
        .await?;

        let catalog: Vec<ResourceKindList> =
            per_group.into_iter().flat_map(prefer_versions).collect();

        tracing::info!(
            "Discovered {} kinds across {} group versions",
            catalog.iter().map(|l| l.resources.len()).sum::<usize>(),
            catalog.len()
        );

        Ok(catalog)
    }
}
