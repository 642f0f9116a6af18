//! Error taxonomy for discovery and listing
//!
//! Only [`DiscoveryError`] ever reaches the caller of an aggregation pass.
//! [`KindListError`] is recovered inside the pass: the kind is logged and
//! left out of the result.

use std::time::Duration;
use thiserror::Error;

/// The discovery catalog could not be retrieved. Fatal to the pass.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery endpoint {endpoint} is unreachable: {source:#}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("discovery endpoint {endpoint} returned a malformed catalog: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("discovery did not complete within {after:?}")]
    TimedOut { after: Duration },
}

/// One kind could not be listed. Never fatal to the pass.
#[derive(Debug, Error)]
pub enum KindListError {
    #[error("listing {resource} failed: {source:#}")]
    Request {
        resource: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("listing {resource} returned an unexpected response: {reason}")]
    Malformed { resource: String, reason: String },

    #[error("listing {resource} timed out after {after:?}")]
    TimedOut { resource: String, after: Duration },

    #[error("cannot resolve group/version {group_version:?} for {resource}")]
    MalformedIdentity {
        group_version: String,
        resource: String,
    },
}
