//! Property-based tests using proptest
//!
//! These tests verify group/version resolution, sub-resource filtering and
//! accumulation of an aggregation pass over randomized catalogs.

use async_trait::async_trait;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use kubecensus::resource::{
    eligible_kinds, object_refs, resolve, Aggregator, AggregatorOptions, CatalogSource,
    DiscoveryError, GroupVersionResource, KindListError, ObjectLister, ObjectRef, ResourceKind,
    ResourceKindList,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Named API groups (never the legacy core token)
fn arb_group() -> impl Strategy<Value = String> {
    "[a-z]{2,8}(\\.[a-z]{2,6}){0,2}".prop_filter("core token", |g| g != "v1")
}

fn arb_version() -> impl Strategy<Value = String> {
    prop_oneof!["v1", "v2", "v1beta1", "v2alpha1"].prop_map(String::from)
}

/// Plural names, some of them sub-resources
fn arb_resource_name() -> impl Strategy<Value = String> {
    ("[a-z]{3,10}", prop::option::of(prop_oneof!["status", "log", "scale", "exec"]))
        .prop_map(|(name, sub)| match sub {
            Some(sub) => format!("{name}/{sub}"),
            None => name,
        })
}

fn arb_catalog() -> impl Strategy<Value = Vec<ResourceKindList>> {
    let core = prop::collection::vec(arb_resource_name(), 0..8).prop_map(|names| {
        ResourceKindList::new(
            "v1",
            names.iter().map(|n| ResourceKind::new(n, "")).collect(),
        )
    });
    let group = (arb_group(), arb_version(), prop::collection::vec(arb_resource_name(), 0..8))
        .prop_map(|(group, version, names)| {
            ResourceKindList::new(
                &format!("{group}/{version}"),
                names.iter().map(|n| ResourceKind::new(n, "")).collect(),
            )
        });
    (core, prop::collection::vec(group, 0..6)).prop_map(|(core, groups)| {
        let mut catalog = vec![core];
        catalog.extend(groups);
        catalog
    })
}

struct FixedCatalog(Vec<ResourceKindList>);

#[async_trait]
impl CatalogSource for FixedCatalog {
    async fn server_preferred_resources(&self) -> Result<Vec<ResourceKindList>, DiscoveryError> {
        Ok(self.0.clone())
    }
}

/// Fails every kind whose name has an even length
struct ParityLister;

fn fails(gvr: &GroupVersionResource) -> bool {
    gvr.resource.len() % 2 == 0
}

#[async_trait]
impl ObjectLister for ParityLister {
    async fn list_objects(
        &self,
        gvr: &GroupVersionResource,
    ) -> Result<Vec<ObjectRef>, KindListError> {
        if fails(gvr) {
            return Err(KindListError::Malformed {
                resource: gvr.to_string(),
                reason: "injected".to_string(),
            });
        }
        Ok(vec![ObjectRef::new(&format!("{}-0", gvr.resource))])
    }
}

proptest! {
    /// A named group resolves to its own segment, never the whole group/version string
    #[test]
    fn named_group_resolves_to_segment(group in arb_group(), version in arb_version()) {
        let gv = format!("{group}/{version}");
        let gvr = resolve(&gv, &ResourceKind::new("things", "")).unwrap();
        prop_assert_eq!(&gvr.group, &group);
        prop_assert_eq!(&gvr.version, &version);
        prop_assert_ne!(gvr.group, gv);
    }

    /// The declared version always wins when present
    #[test]
    fn declared_version_wins(group in arb_group(), wire in arb_version(), declared in arb_version()) {
        let gvr = resolve(&format!("{group}/{wire}"), &ResourceKind::new("things", &declared)).unwrap();
        prop_assert_eq!(gvr.version, declared);
    }

    /// Legacy core always resolves to an empty group and v1
    #[test]
    fn legacy_core_is_empty_group(name in "[a-z]{3,10}", declared in prop_oneof!["", "v1"]) {
        let gvr = resolve("v1", &ResourceKind::new(&name, &declared)).unwrap();
        prop_assert_eq!(gvr.group.as_str(), "");
        prop_assert_eq!(gvr.version.as_str(), "v1");
        prop_assert_eq!(gvr.list_path(), format!("/api/v1/{name}"));
    }

    /// Eligible kinds never contain sub-resources or duplicates
    #[test]
    fn eligible_kinds_are_unique_collections(catalog in arb_catalog()) {
        let kinds = eligible_kinds(&catalog);
        let unique: HashSet<&GroupVersionResource> = kinds.iter().collect();
        prop_assert_eq!(unique.len(), kinds.len());
        prop_assert!(kinds.iter().all(|k| !k.resource.contains('/')));

        let expected: HashSet<GroupVersionResource> = catalog
            .iter()
            .flat_map(|l| l.resources.iter().map(move |k| (l, k)))
            .filter(|(_, k)| !k.name.contains('/'))
            .map(|(l, k)| resolve(&l.group_version, k).unwrap())
            .collect();
        prop_assert_eq!(unique.len(), expected.len());
    }

    /// A pass yields exactly one summary per eligible kind that did not fail
    #[test]
    fn pass_accumulates_every_successful_kind(catalog in arb_catalog()) {
        let kinds = eligible_kinds(&catalog);
        let expected = kinds.iter().filter(|k| !fails(k)).count();

        let aggregator = Aggregator::new(
            Arc::new(FixedCatalog(catalog)),
            Arc::new(ParityLister),
            AggregatorOptions::default(),
        );
        let result = tokio_test::block_on(aggregator.aggregate()).unwrap();

        prop_assert_eq!(result.len(), expected);
        let unique: HashSet<(&str, &str, &str)> = result
            .iter()
            .map(|s| (s.group.as_str(), s.version.as_str(), s.resource_name.as_str()))
            .collect();
        prop_assert_eq!(unique.len(), result.len());
        for summary in &result {
            prop_assert_eq!(&summary.names, &vec![format!("{}-0", summary.resource_name)]);
        }
    }

    /// Every named object of a list becomes an object reference, in order
    #[test]
    fn object_refs_keep_every_named_object(names in prop::collection::vec("[a-z0-9-]{1,20}", 0..50)) {
        let resource = ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk("example.com", "v1", "Widget"),
            "widgets",
        );
        let objects = names.iter().map(|n| DynamicObject::new(n, &resource));
        let extracted: Vec<String> = object_refs(objects).into_iter().map(|o| o.name).collect();
        prop_assert_eq!(extracted, names);
    }
}
