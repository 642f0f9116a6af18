//! Kubernetes API access
//!
//! Connection settings and the shared client, both built on `kube`, plus
//! typed pod listing.
//!
//! - [`kubeconfig`] - resolve the API server and credentials
//! - [`client`] - the client shared by discovery, listing and `/pods`
//! - [`pods`] - typed pod listing
//!
//! # Example
//!
//! ```ignore
//! use kubecensus::cluster::{kubeconfig, ClusterClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let config = kubeconfig::load_config(None, Some("staging")).await?;
//!     let client = ClusterClient::try_from_config(config, None)?;
//!     let groups = client.kube().list_api_groups().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod kubeconfig;
pub mod pods;

pub use client::{format_api_error, ClusterClient};
