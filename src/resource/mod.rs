//! Resource discovery and aggregation
//!
//! This module turns the open-ended set of kinds a cluster serves into one
//! merged inventory.
//!
//! # Architecture
//!
//! - [`discovery`] - Fetches the catalog of kinds, each under its preferred serving version
//! - [`identity`] - Catalog types, group/version resolution, sub-resource detection
//! - [`lister`] - Schema-agnostic listing of any `(group, version, resource)`
//! - [`aggregator`] - Concurrent fan-out over every eligible kind
//! - [`error`] - Pass-level and per-kind errors
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use kubecensus::resource::{Aggregator, AggregatorOptions};
//!
//! async fn inventory(client: kubecensus::cluster::ClusterClient) -> anyhow::Result<()> {
//!     let client = Arc::new(client);
//!     let aggregator = Aggregator::new(client.clone(), client, AggregatorOptions::default());
//!     for summary in &aggregator.aggregate().await? {
//!         println!("{} {}", summary.resource_name, summary.names.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod lister;

pub use aggregator::{
    eligible_kinds, AggregationResult, Aggregator, AggregatorOptions, ConcurrencyLimit,
    ResourceSummary,
};
pub use discovery::CatalogSource;
pub use error::{DiscoveryError, KindListError};
pub use identity::{is_sub_resource, resolve, GroupVersionResource, ResourceKind, ResourceKindList};
pub use lister::{object_refs, ObjectLister, ObjectRef};
