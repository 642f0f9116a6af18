//! Connection settings
//!
//! Where the API server is and how to authenticate against it. Loading is
//! delegated to `kube`, so exec and auth-provider credential plugins,
//! token files and client certificates behave as they do for kubectl.

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::Path;

/// Resolve cluster settings
///
/// - An explicit kubeconfig file is read as-is, honouring `context`.
/// - Otherwise a `context` selects from `$KUBECONFIG` or `~/.kube/config`.
/// - Otherwise settings are inferred: kubeconfig first, then the in-cluster
///   service account.
pub async fn load_config(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Config> {
    match (kubeconfig, context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            from_kubeconfig(kubeconfig, context).await
        }
        (None, Some(_)) => Config::from_kubeconfig(&options(context))
            .await
            .context("Failed to load kubeconfig"),
        (None, None) => Config::infer()
            .await
            .context("Failed to infer cluster settings"),
    }
}

/// Settings for `context` (or the current context) of a parsed kubeconfig
pub async fn from_kubeconfig(kubeconfig: Kubeconfig, context: Option<&str>) -> Result<Config> {
    Config::from_custom_kubeconfig(kubeconfig, &options(context))
        .await
        .with_context(|| match context {
            Some(context) => format!("Failed to load kubeconfig context {context}"),
            None => "Failed to load kubeconfig current-context".to_string(),
        })
}

fn options(context: Option<&str>) -> KubeConfigOptions {
    KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    }
}

/// How requests will authenticate, for the startup log
pub fn auth_method(config: &Config) -> &'static str {
    let auth = &config.auth_info;
    if auth.exec.is_some() {
        "exec plugin"
    } else if auth.auth_provider.is_some() {
        "auth provider"
    } else if auth.token.is_some() || auth.token_file.is_some() {
        "bearer token"
    } else if auth.username.is_some() {
        "basic"
    } else if auth.client_certificate.is_some() || auth.client_certificate_data.is_some() {
        "client certificate"
    } else {
        "none"
    }
}
