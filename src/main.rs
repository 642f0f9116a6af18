use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kubecensus::config::Config;
use kubecensus::cluster::{kubeconfig, ClusterClient};
use kubecensus::resource::Aggregator;
use kubecensus::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Serve an inventory of every resource in a Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "kubecensus", version, about, long_about = None)]
struct Args {
    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of current-context
    #[arg(long)]
    context: Option<String>,

    /// Seconds allowed per list call, 0 for no limit
    #[arg(long)]
    list_timeout: Option<u64>,

    /// Seconds allowed per aggregation pass, 0 for no limit
    #[arg(long)]
    pass_timeout: Option<u64>,

    /// Maximum list calls in flight, 0 for unbounded
    #[arg(long)]
    max_concurrent_lists: Option<usize>,

    /// Config file (defaults to <config dir>/kubecensus/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Config {
        Config {
            port: self.port,
            bind_address: self.bind.clone(),
            kubeconfig: self.kubeconfig.clone(),
            context: self.context.clone(),
            list_timeout_secs: self.list_timeout,
            pass_timeout_secs: self.pass_timeout,
            max_concurrent_lists: self.max_concurrent_lists,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => match level.to_tracing_level() {
            Some(level) => EnvFilter::new(level.as_str().to_lowercase()),
            None => return Ok(None),
        },
    };

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .init();

    tracing::debug!("Logging at {:?}", level);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_ref())?;

    let file_config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let config = file_config.merged(args.overrides());

    let cluster = kubeconfig::load_config(config.kubeconfig.as_deref(), config.context.as_deref())
        .await
        .context("Error getting Kubernetes config")?;
    tracing::info!(
        "Using API server {} (auth: {})",
        cluster.cluster_url,
        kubeconfig::auth_method(&cluster)
    );

    let client = Arc::new(
        ClusterClient::try_from_config(cluster, config.list_timeout())
            .context("Error creating Kubernetes client")?,
    );

    let options = config.aggregator_options();
    tracing::info!(
        "Aggregation: concurrency {:?}, list timeout {:?}, pass deadline {:?}",
        options.concurrency,
        options.list_timeout,
        options.pass_deadline
    );

    let state = AppState {
        aggregator: Aggregator::new(client.clone(), client.clone(), options),
        pods: client,
    };

    let addr = format!("{}:{}", config.effective_bind_address(), config.effective_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Error starting HTTP server on {addr}"))?;
    tracing::info!("Starting server on {}", addr);

    server::serve(listener, server::create_app(state)).await
}
