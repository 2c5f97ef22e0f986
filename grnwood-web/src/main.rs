//! Grnwood Web Server
//!
//! Gateway for the grnwood network: federated sign-in and business records.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use grnwood_core::{init_logging, GatewayConfig};
use grnwood_web::server::GrnwoodServerBuilder;
use tracing::{info, warn};

/// Grnwood Web Server - graph-backed gateway for the grnwood network
#[derive(Parser)]
#[command(name = "grnwood-web")]
#[command(about = "HTTP gateway for the grnwood network")]
#[command(version)]
struct Args {
    /// TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default(),
    };
    config.apply_env()?;

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    // validate() refuses dev secrets once COOKIE_SECURE is on
    if config.auth.uses_dev_secrets() {
        warn!("Using built-in development token secrets; set ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET");
    }
    if !config.auth.cookie_secure {
        warn!("Refresh cookie is not marked Secure; set COOKIE_SECURE=true behind HTTPS");
    }

    let mut builder = GrnwoodServerBuilder::new(config);
    if let Some(host) = args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }

    let server = builder.build().await?;
    info!("Server built successfully");

    server.start().await?;
    Ok(())
}
