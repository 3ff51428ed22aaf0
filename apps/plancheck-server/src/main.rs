//! Plancheck Server
//!
//! Checks DXF floor plans for occupancy compliance: every room outline on a
//! qualifying layer needs a door and a minimum area. Runs either as a REST
//! service or as a one-shot CLI.
//!
//! ## Architecture
//!
//! - `shared-dxf` decodes the upload into a drawing snapshot
//! - `compliance-engine` produces the report on the blocking pool
//! - results are kept in memory under a random token, oldest evicted first
//! - rate limiting via tower-governor

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use compliance_engine::{CheckConfig, ComplianceEngine};
use tokio::sync::RwLock;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_check, handle_get_result, handle_get_summary, handle_health, ResultStore};

/// Command-line arguments for the plancheck server
#[derive(Parser, Debug)]
#[command(name = "plancheck-server")]
#[command(about = "Occupancy compliance checks for DXF floor plans")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve(ServeArgs),
    /// Check one DXF file and print the outcome as JSON
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Check timeout in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,

    /// Rate limit: requests per second per IP
    #[arg(long, default_value_t = 10)]
    rate_limit: u32,

    /// Maximum request body size in megabytes
    #[arg(long, default_value_t = 50)]
    max_upload_mb: usize,

    /// Number of stored results kept before the oldest are evicted
    #[arg(long, default_value_t = 1000)]
    max_results: usize,

    /// JSON config file with check defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            timeout_ms: 30000,
            rate_limit: 10,
            max_upload_mb: 50,
            max_results: 1000,
            config: None,
        }
    }
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// DXF file to check
    file: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Defaults for every check; requests may override fields
    pub config: Arc<CheckConfig>,
    /// Check timeout in milliseconds
    pub timeout_ms: u64,
    pub results: Arc<RwLock<ResultStore>>,
}

impl AppState {
    pub fn new(config: CheckConfig, timeout_ms: u64, max_results: usize) -> Self {
        Self {
            config: Arc::new(config),
            timeout_ms,
            results: Arc::new(RwLock::new(ResultStore::new(max_results))),
        }
    }
}

/// Routes and body limit, without rate limiting or CORS
pub fn app_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(handle_health))
        .route("/api/check", post(handle_check))
        .route("/api/results/:token", get(handle_get_result))
        .route("/api/results/:token/summary", get(handle_get_summary))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<CheckConfig> {
    match path {
        Some(path) => Ok(CheckConfig::from_file(path)?),
        None => Ok(CheckConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Command::Check(args)) => run_check(args),
        Some(Command::Serve(args)) => serve(args).await,
        None => serve(ServeArgs::default()).await,
    }
}

fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let engine = ComplianceEngine::with_config(config)?;
    let drawing = shared_dxf::load_file(&args.file)?;
    let outcome = engine.check(&drawing);

    let json = if args.pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{}", json);
    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    config.validate()?;

    info!("Starting plancheck server on {}:{}", args.host, args.port);

    // Create rate limiter configuration
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.into())
            .burst_size(args.rate_limit * 2)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit: {}", args.rate_limit))?,
    );

    let state = AppState::new(config, args.timeout_ms, args.max_results);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = app_router(state, args.max_upload_mb * 1024 * 1024)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Check timeout: {}ms", args.timeout_ms);
    info!("Keeping at most {} stored results", args.max_results);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
