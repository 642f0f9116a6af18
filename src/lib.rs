//! kubecensus
//!
//! Enumerates every resource kind a Kubernetes cluster serves, lists the
//! live objects of each kind concurrently, and serves the merged inventory
//! over HTTP.
//!
//! - [`cluster`] - API server access (kubeconfig, shared client, pods)
//! - [`resource`] - discovery catalog and the concurrent aggregation pass
//! - [`server`] - axum routes rendering the inventory as JSON or HTML
//! - [`config`] - persisted defaults and CLI overrides

pub mod cluster;
pub mod config;
pub mod resource;
pub mod server;
