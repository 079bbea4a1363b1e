//! PDF forms MCP Server - Entry point
//!
//! Positional arguments are resource directories that path sources and
//! output paths are confined to.

use pdf_forms_mcp::run_server_with_dirs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_forms_mcp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let resource_dirs: Vec<String> = std::env::args().skip(1).collect();
    tracing::info!(?resource_dirs, "Starting PDF forms MCP Server");

    run_server_with_dirs(resource_dirs).await
}
