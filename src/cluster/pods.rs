//! Pods
//!
//! Typed access to the core `pods` collection, alongside the schema-agnostic
//! listing in [`crate::resource::lister`].

use super::client::ClusterClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod as PodObject;
use kube::api::{Api, ListParams, ResourceExt};
use serde::Serialize;

/// Pod identity as served by `/pods`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
}

impl From<&PodObject> for Pod {
    fn from(pod: &PodObject) -> Self {
        Self {
            name: pod.name_any(),
            namespace: pod.namespace().unwrap_or_default(),
        }
    }
}

/// Source of pods across all namespaces
#[async_trait]
pub trait PodSource: Send + Sync {
    async fn list_pods(&self) -> Result<Vec<Pod>>;
}

#[async_trait]
impl PodSource for ClusterClient {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        let pods: Api<PodObject> = Api::all(self.kube().clone());
        let list = pods
            .list(&ListParams::default())
            .await
            .context("Failed to list pods")?;
        Ok(list.items.iter().map(Pod::from).collect())
    }
}
