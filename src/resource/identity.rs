//! Resource identity
//!
//! Catalog entries as the API server reports them, and the rules that turn
//! a `(groupVersion, kind)` pair into the `(group, version, resource)`
//! triple used to address a list endpoint.

use super::error::KindListError;
use std::fmt;

/// Group/version token of the legacy core API (`/api/v1`)
pub const LEGACY_CORE_VERSION: &str = "v1";

/// One kind served by the API server (an `APIResource` entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKind {
    /// Plural, lowercase resource name (`pods`, `deployments`, `pods/log`)
    pub name: String,
    /// Declared version; servers usually leave this empty
    pub version: String,
}

impl ResourceKind {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    pub fn is_sub_resource(&self) -> bool {
        is_sub_resource(&self.name)
    }
}

/// All kinds served under one group/version (an `APIResourceList` document)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKindList {
    pub group_version: String,
    pub resources: Vec<ResourceKind>,
}

impl ResourceKindList {
    pub fn new(group_version: &str, resources: Vec<ResourceKind>) -> Self {
        Self {
            group_version: group_version.to_string(),
            resources,
        }
    }
}

/// Resolved address of a listable collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    pub resource: String,
}

impl GroupVersionResource {
    pub fn new(group: &str, version: &str, resource: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
        }
    }

    /// True for kinds of the legacy core group (served under `/api`)
    pub fn is_core(&self) -> bool {
        self.group.is_empty()
    }

    /// API path of the cluster-wide collection
    ///
    /// e.g. `/api/v1/pods`, `/apis/apps/v1/deployments`
    pub fn list_path(&self) -> String {
        if self.is_core() {
            format!("/api/{}/{}", self.version, self.resource)
        } else {
            format!("/apis/{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_core() {
            write!(f, "{}/{}", self.version, self.resource)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.resource)
        }
    }
}

/// A name containing a path separator addresses a sub-resource
/// (`pods/log`, `deployments/scale`), which is not a listable collection.
pub fn is_sub_resource(name: &str) -> bool {
    name.contains('/')
}

/// Resolve the list address of `kind`, reported under `group_version`
///
/// - The first `/`-separated segment is the group, or empty when there is
///   no separator.
/// - A first segment equal to `v1` is the legacy core group: group `""`,
///   version `v1`.
/// - The version is the kind's declared version, or the version segment of
///   `group_version` when the declaration is empty.
pub fn resolve(
    group_version: &str,
    kind: &ResourceKind,
) -> Result<GroupVersionResource, KindListError> {
    let malformed = || KindListError::MalformedIdentity {
        group_version: group_version.to_string(),
        resource: kind.name.clone(),
    };

    let mut segments = group_version.split('/');
    let head = segments.next().unwrap_or_default();
    let tail = segments.next();
    if head.is_empty() || segments.next().is_some() || tail == Some("") {
        return Err(malformed());
    }

    if head == LEGACY_CORE_VERSION {
        return Ok(GroupVersionResource::new(
            "",
            LEGACY_CORE_VERSION,
            &kind.name,
        ));
    }

    let (group, wire_version) = match tail {
        Some(version) => (head, version),
        None => ("", head),
    };
    let version = if kind.version.is_empty() {
        wire_version
    } else {
        kind.version.as_str()
    };

    Ok(GroupVersionResource::new(group, version, &kind.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &str, version: &str) -> ResourceKind {
        ResourceKind::new(name, version)
    }

    #[test]
    fn test_legacy_core_resolves_to_empty_group() {
        let gvr = resolve("v1", &kind("pods", "v1")).unwrap();
        assert_eq!(gvr, GroupVersionResource::new("", "v1", "pods"));
        assert_eq!(gvr.list_path(), "/api/v1/pods");
    }

    #[test]
    fn test_legacy_core_ignores_undeclared_version() {
        let gvr = resolve("v1", &kind("configmaps", "")).unwrap();
        assert_eq!(gvr.group, "");
        assert_eq!(gvr.version, "v1");
    }

    #[test]
    fn test_named_group_takes_segment_before_separator() {
        let gvr = resolve("apps/v1", &kind("deployments", "v1")).unwrap();
        assert_eq!(gvr, GroupVersionResource::new("apps", "v1", "deployments"));
        assert_eq!(gvr.list_path(), "/apis/apps/v1/deployments");
    }

    #[test]
    fn test_declared_version_wins_over_group_version() {
        let gvr = resolve("batch/v1", &kind("cronjobs", "v1beta1")).unwrap();
        assert_eq!(gvr.group, "batch");
        assert_eq!(gvr.version, "v1beta1");
    }

    #[test]
    fn test_missing_declared_version_falls_back_to_group_version() {
        let gvr = resolve("networking.k8s.io/v1", &kind("ingresses", "")).unwrap();
        assert_eq!(gvr.group, "networking.k8s.io");
        assert_eq!(gvr.version, "v1");
    }

    #[test]
    fn test_group_is_never_whole_group_version() {
        let gvr = resolve("apps/v1", &kind("replicasets", "")).unwrap();
        assert_ne!(gvr.group, "apps/v1");
    }

    #[test]
    fn test_malformed_group_versions_are_rejected() {
        for gv in ["", "/v1", "apps/", "a/b/c"] {
            let err = resolve(gv, &kind("things", "v1")).unwrap_err();
            assert!(
                matches!(err, KindListError::MalformedIdentity { .. }),
                "expected malformed identity for {gv:?}"
            );
        }
    }

    #[test]
    fn test_sub_resource_detection() {
        assert!(is_sub_resource("pods/log"));
        assert!(is_sub_resource("deployments/scale"));
        assert!(!is_sub_resource("pods"));
        assert!(kind("pods/status", "v1").is_sub_resource());
    }
}
