//! Generic object lister
//!
//! Lists any `(group, version, resource)` collection without knowing its
//! schema, keeping only each object's name and labels.

use super::error::KindListError;
use super::identity::GroupVersionResource;
use crate::cluster::ClusterClient;
use async_trait::async_trait;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use std::collections::BTreeMap;

#[cfg(test)]
use mockall::automock;

/// Identity of one live object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub name: String,
    pub labels: Option<BTreeMap<String, String>>,
}

impl ObjectRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: None,
        }
    }

    pub fn with_labels<'a>(mut self, labels: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.labels = Some(
            labels
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }
}

/// Schema-agnostic list capability
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_objects(&self, gvr: &GroupVersionResource)
        -> Result<Vec<ObjectRef>, KindListError>;
}

#[async_trait]
impl ObjectLister for ClusterClient {
    async fn list_objects(
        &self,
        gvr: &GroupVersionResource,
    ) -> Result<Vec<ObjectRef>, KindListError> {
        // Only the plural addresses the collection; the kind is not needed
        let resource = ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(&gvr.group, &gvr.version, ""),
            &gvr.resource,
        );
        let api: Api<DynamicObject> = Api::all_with(self.kube().clone(), &resource);

        tracing::debug!("GET {}", gvr.list_path());

        match api.list(&ListParams::default()).await {
            Ok(list) => Ok(object_refs(list.items)),
            Err(kube::Error::SerdeError(err)) => Err(KindListError::Malformed {
                resource: gvr.to_string(),
                reason: err.to_string(),
            }),
            Err(err) => Err(KindListError::Request {
                resource: gvr.to_string(),
                source: err.into(),
            }),
        }
    }
}

/// Name and labels of every listed object
///
/// Objects without `metadata.name` are skipped.
pub fn object_refs(objects: impl IntoIterator<Item = DynamicObject>) -> Vec<ObjectRef> {
    objects
        .into_iter()
        .filter_map(|object| {
            let Some(name) = object.metadata.name else {
                tracing::debug!("Skipping list item without metadata.name");
                return None;
            };
            Some(ObjectRef {
                name,
                labels: object.metadata.labels,
            })
        })
        .collect()
}
