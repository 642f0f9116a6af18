//! HTTP surface
//!
//! - `GET /resources` - one aggregation pass as JSON, or HTML when asked for
//! - `GET /` - the same report as an HTML page
//! - `GET /pods` - every pod's name and namespace

pub mod error;
pub mod render;

use crate::cluster::pods::{Pod, PodSource};
use crate::resource::Aggregator;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use error::AppResult;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    pub pods: Arc<dyn PodSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Html,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: Option<ReportFormat>,
}

/// Prefer HTML only when the client lists it ahead of JSON (browsers)
fn negotiate(headers: &HeaderMap) -> ReportFormat {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return ReportFormat::Json;
    };
    match (accept.find("text/html"), accept.find("application/json")) {
        (Some(html), Some(json)) if html < json => ReportFormat::Html,
        (Some(_), None) => ReportFormat::Html,
        _ => ReportFormat::Json,
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/resources", get(resources))
        .route("/pods", get(pods))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn resources(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let format = query.format.unwrap_or_else(|| negotiate(&headers));
    let result = state.aggregator.aggregate().await?;

    Ok(match format {
        ReportFormat::Json => Json(result).into_response(),
        ReportFormat::Html => Html(render::render_html(result)).into_response(),
    })
}

async fn index(State(state): State<AppState>) -> AppResult<Html<String>> {
    let result = state.aggregator.aggregate().await?;
    Ok(Html(render::render_html(result)))
}

async fn pods(State(state): State<AppState>) -> AppResult<Json<Vec<Pod>>> {
    let pods = state.pods.list_pods().await?;
    Ok(Json(pods))
}

/// Serve until Ctrl-C / SIGTERM
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down");
}
