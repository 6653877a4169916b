use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use era5_mcp::Era5McpServer;
use era5_mcp::archive::{CdsConnector, ClientOptions};
use era5_mcp::config::CredentialOverrides;

#[derive(Parser, Debug)]
#[command(name = "era5-mcp", version, about = "ERA5 Climate Data MCP server (stdio).")]
struct Cli {
    /// CDS API base URL (overrides .cdsapirc).
    #[arg(long, env = "CDSAPI_URL")]
    url: Option<String>,

    /// CDS API key: a personal access token, or `<UID>:<APIKEY>` for the legacy API.
    #[arg(long, env = "CDSAPI_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Configuration file to read instead of ./.cdsapirc and ~/.cdsapirc.
    #[arg(long, env = "CDSAPI_RC")]
    rc: Option<PathBuf>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    no_verify: bool,

    /// Draw a download progress bar on stderr.
    #[arg(long)]
    progress: bool,

    /// Attempts for transient HTTP failures and interrupted downloads.
    #[arg(long, default_value_t = 500)]
    retry_max: usize,

    /// Seconds between retries; also caps the job polling interval.
    #[arg(long, default_value_t = 120)]
    sleep_max_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Log level when RUST_LOG is not set (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_parser = parse_level)]
    log_level: log::LevelFilter,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.log_level);

    let overrides = CredentialOverrides {
        url: cli.url,
        key: cli.key,
        verify: cli.no_verify.then_some(false),
        rc_path: cli.rc,
    };
    let options = ClientOptions {
        timeout: Duration::from_secs(cli.timeout_secs),
        retry_max: cli.retry_max.max(1),
        sleep_max: Duration::from_secs(cli.sleep_max_secs),
        progress: cli.progress,
    };

    info!("ERA5 MCP server starting on stdio");
    let server = Era5McpServer::new(Arc::new(CdsConnector::new(overrides, options)));
    server.serve_stdio().await.context("MCP server stopped")?;
    Ok(())
}

fn parse_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not one of off, error, warn, info, debug, trace"))
}

/// stdout carries the protocol, so logs always go to stderr.
fn initialize_logging(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();
}
