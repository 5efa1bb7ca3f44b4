//! locator binary entry point.
//!
//! Resolves content locations interactively and, when given an
//! inventory file, keeps this node registered with the directory.
//!
//! Usage:
//! ```bash
//! # Resolve keys typed on stdin
//! locator ndn:/edu/campus
//!
//! # Also announce the local inventory while running
//! locator ndn:/edu/campus --inventory holdings.txt
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use locator_client::{ClientError, DirectoryClient, FileInventory};
use locator_transport::{ForwarderTransport, Transport};
use locator_types::{ContentKey, Name};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Content-location resolver and announcer.
///
/// Reads content keys from stdin, one per line, and prints the hosts
/// the directory reports for each.
#[derive(Parser, Debug)]
#[command(name = "locator")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory name prefix, e.g. ndn:/edu/campus
    prefix: String,

    /// Inventory file to announce (one content identifier per line)
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Re-announce every this many seconds instead of following the
    /// directory's freshness hint (must be > 0)
    #[arg(short = 'x', long = "freshness")]
    freshness: Option<u64>,

    /// Forwarder daemon address
    #[arg(long, default_value = "127.0.0.1:6363")]
    forwarder: String,

    /// Seconds to wait for each query before giving up
    #[arg(long, default_value_t = 3)]
    query_timeout: u64,
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

    let base = Name::from_uri(&cli.prefix)
        .with_context(|| format!("bad name prefix: {}", cli.prefix))?;

    let transport = Arc::new(
        ForwarderTransport::connect(&cli.forwarder)
            .await
            .with_context(|| format!("cannot connect to forwarder {}", cli.forwarder))?,
    );

    // Interests never resolve unless someone drives the transport.
    {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            loop {
                if let Err(e) = transport.poll(Duration::from_millis(500)).await {
                    tracing::error!("transport failed: {e}");
                    break;
                }
            }
        });
    }

    let mut client = DirectoryClient::new(transport, base)
        .with_query_timeout(Duration::from_secs(cli.query_timeout));
    if let Some(freshness) = cli.freshness {
        anyhow::ensure!(freshness > 0, "freshness seconds must be > 0");
        client = client.with_announce_interval(Duration::from_secs(freshness));
    }
    let client = Arc::new(client);

    if let Some(path) = &cli.inventory {
        let inventory = FileInventory::new(path);
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.run_announce_loop(&inventory).await });
    }

    resolve_stdin(&client).await
}

/// Read keys from stdin and print the hosts claiming each.
async fn resolve_stdin(client: &DirectoryClient) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(key) = ContentKey::new(&line) else {
            continue;
        };

        match client.where_is(&key).await {
            Ok(hosts) if hosts.is_empty() => println!("{key}: no known holders"),
            Ok(hosts) => {
                for host in hosts {
                    println!("{key}: {host}");
                }
            }
            Err(ClientError::Timeout { .. }) => eprintln!("{key}: no response"),
            Err(e) => eprintln!("{key}: query failed: {e}"),
        }
    }
    Ok(())
}
