//! Cluster Client
//!
//! The `kube` client shared by discovery, listing and the typed pod
//! endpoint, plus user-facing formatting of its errors.

use anyhow::{Context, Result};
use kube::{Client, Config};
use std::time::Duration;

/// Main cluster client
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from resolved settings; `read_timeout` bounds each response
    pub fn try_from_config(mut config: Config, read_timeout: Option<Duration>) -> Result<Self> {
        if read_timeout.is_some() {
            config.read_timeout = read_timeout;
        }
        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self::new(client))
    }

    pub fn kube(&self) -> &Client {
        &self.client
    }
}

/// Format an API error for display
pub fn format_api_error(error: &anyhow::Error) -> String {
    let code = error
        .chain()
        .find_map(|e| match e.downcast_ref::<kube::Error>() {
            Some(kube::Error::Api(response)) => Some(response.code),
            _ => None,
        });

    if let Some(code) = code {
        return match code {
            401 => "Authentication failed. Check the credentials in your kubeconfig.".to_string(),
            403 => "Permission denied. Check your RBAC permissions.".to_string(),
            404 => "Resource not found.".to_string(),
            405 => "Resource does not support listing.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500..=599 => "API server temporarily unavailable. Please try again.".to_string(),
            code => format!("Request failed with status {code}."),
        };
    }

    let error_str = format!("{error:#}");
    let sanitized = error_str
        .chars()
        .filter(|c| !c.is_control())
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
