//! locatord binary entry point.
//!
//! Usage:
//! ```bash
//! locatord ndn:/edu/campus -i eth0 -p 7700
//! locatord ndn:/edu/campus -x 5 --forwarder 127.0.0.1:6363
//! locatord --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use locator_directory::{Config, Directory};
use locator_transport::ForwarderTransport;
use locator_types::Name;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Content-location directory daemon.
///
/// Answers `<prefix>/server` and `<prefix>/where/<key>` interests and
/// accepts inventory registrations over TCP.
#[derive(Parser, Debug)]
#[command(name = "locatord")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Base name prefix to serve, e.g. ndn:/edu/campus
    prefix: String,

    /// Freshness seconds attached to responses (must be > 0)
    #[arg(short = 'x', long = "freshness")]
    freshness: Option<u32>,

    /// Interface whose address is announced as the upload endpoint
    #[arg(short = 'i', long = "interface")]
    interface: Option<String>,

    /// TCP port for the registration listener
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Forwarder daemon address
    #[arg(long)]
    forwarder: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    // Flags override file values.
    if let Some(freshness) = cli.freshness {
        anyhow::ensure!(freshness > 0, "freshness seconds must be > 0");
        config.directory.freshness_secs = freshness;
    }
    if let Some(interface) = cli.interface {
        config.ingest.interface = Some(interface);
    }
    if let Some(port) = cli.port {
        config.ingest.port = port;
    }
    if let Some(forwarder) = cli.forwarder {
        config.transport.forwarder = forwarder;
    }

    let base = Name::from_uri(&cli.prefix)
        .with_context(|| format!("bad name prefix: {}", cli.prefix))?;

    let identity = config
        .resolve_identity()
        .context("cannot resolve directory identity")?;

    let directory = Directory::new(identity, &config);
    let listen: SocketAddr = SocketAddr::new("0.0.0.0".parse().unwrap(), config.ingest.port);
    let ingest = directory
        .bind_ingest(listen)
        .await
        .context("cannot bind registration listener")?;

    let transport = Arc::new(
        ForwarderTransport::connect(&config.transport.forwarder)
            .await
            .with_context(|| format!("cannot connect to forwarder {}", config.transport.forwarder))?,
    );

    tokio::select! {
        result = directory.run(transport, base, ingest) => {
            result.context("directory loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }

    Ok(())
}
