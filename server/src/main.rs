use anyhow::Result;
use clap::Parser;
use server::{build_app, AppState};
use sparsedex_core::ServiceConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Workspace directory holding the index, vocabulary and documents
    #[arg(long, default_value = "./workspace")]
    workspace: String,
    /// Optional JSON service config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServiceConfig::load_or_default(args.config.as_deref())?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::open(&args.workspace, config, admin_token)?;
    let app = build_app(state.clone());

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    let meta = state.service.write().persist()?;
    tracing::info!(num_docs = meta.num_docs, "persisted on shutdown");
    Ok(())
}
