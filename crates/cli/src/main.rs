//! Operator CLI for a shardwatch storage cluster.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod render;

use error::{Error, Result};

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use shardwatch_activity_log::{
    DEFAULT_TABLE, LogStreamReader, PostgrestActivityLog, PostgrestConfig,
};
use shardwatch_control::{FaultInjector, PendingOperations, TransferCoordinator};
use shardwatch_monitor::ClusterMonitor;
use shardwatch_node_client::NodeClient;
use shardwatch_topology::{ClusterTopology, NodeId, NodeIdentity};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

#[derive(Clone, Debug, Parser)]
#[command(name = "shardwatch", version, about, long_about = None)]
struct Args {
    /// Cluster configuration file (TOML). Defaults to the built-in cluster.
    #[arg(long, global = true, env = "SHARDWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Override the poll interval, in milliseconds
    #[arg(long, global = true, env = "SHARDWATCH_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Log store project URL
    #[arg(long, global = true, env = "SUPABASE_URL")]
    supabase_url: Option<Url>,

    /// Log store API key
    #[arg(long, global = true, env = "SUPABASE_KEY", hide_env_values = true)]
    supabase_key: Option<String>,

    /// Log store table
    #[arg(long, global = true, default_value = DEFAULT_TABLE)]
    log_table: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Poll the cluster continuously until interrupted.
    Watch,

    /// Run a single poll cycle and print the result.
    Status {
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload a file through one node.
    Upload {
        /// File to upload
        path: PathBuf,

        /// Node to upload through
        #[arg(long)]
        node: String,
    },

    /// Download content by master hash through one node.
    Download {
        /// Master hash returned by upload
        master_hash: String,

        /// Node to download from
        #[arg(long)]
        node: String,

        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Wipe the storage of the cluster's attack target.
    Attack,

    /// Print the latest activity log window.
    Logs,

    /// List the hashes and chunks one node holds.
    Hashes {
        /// Node to inspect
        #[arg(long)]
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let args = Args::parse();
    let topology = load_topology(&args)?;
    let client = NodeClient::new(*topology.timeouts())?;

    match args.command.clone() {
        Command::Watch => watch(topology, client, activity_log(&args)?).await,
        Command::Status { json } => status(topology, client, activity_log(&args)?, json).await,
        Command::Upload { path, node } => {
            let transfers = TransferCoordinator::new(topology, client, PendingOperations::new());
            let receipt = transfers.upload_path(&NodeId::from(node), path).await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
            Ok(())
        }
        Command::Download {
            master_hash,
            node,
            output,
        } => {
            let transfers = TransferCoordinator::new(topology, client, PendingOperations::new());
            let content = transfers
                .download(&NodeId::from(node), &master_hash)
                .await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &content).await?;
                    info!("Wrote {} bytes to {}", content.len(), path.display());
                }
                None => tokio::io::stdout().write_all(&content).await?,
            }
            Ok(())
        }
        Command::Attack => {
            let injector = FaultInjector::new(&topology, client, PendingOperations::new());
            let ack = injector.trigger_attack().await?;
            println!("{}: {}", ack.status, ack.message);
            Ok(())
        }
        Command::Logs => {
            let reader = LogStreamReader::new(activity_log(&args)?, topology.log_window());
            for event in reader.try_fetch().await? {
                println!("{}", render::event(&event));
            }
            Ok(())
        }
        Command::Hashes { node } => {
            let node = resolve(&topology, &node)?;
            print!("{}", render::inventory(&client.hashes(node).await?));
            Ok(())
        }
    }
}

fn load_topology(args: &Args) -> Result<ClusterTopology> {
    let topology = match &args.config {
        Some(path) => {
            info!("Loading cluster configuration from {}", path.display());
            ClusterTopology::from_file(path)?
        }
        None => ClusterTopology::default_cluster(),
    };

    match args.poll_interval_ms {
        Some(ms) => Ok(topology.with_poll_interval(Duration::from_millis(ms))?),
        None => Ok(topology),
    }
}

fn activity_log(args: &Args) -> Result<PostgrestActivityLog> {
    let log = PostgrestActivityLog::new(PostgrestConfig {
        url: args.supabase_url.clone(),
        api_key: args.supabase_key.clone(),
        table: args.log_table.clone(),
        ..PostgrestConfig::default()
    })?;

    if !log.is_configured() {
        warn!("SUPABASE_URL or SUPABASE_KEY not set; activity log unavailable");
    }

    Ok(log)
}

fn resolve<'a>(topology: &'a ClusterTopology, node: &str) -> Result<&'a NodeIdentity> {
    topology
        .node(&NodeId::from(node))
        .ok_or_else(|| Error::UnknownNode(node.to_string()))
}

async fn status(
    topology: ClusterTopology,
    client: NodeClient,
    log: PostgrestActivityLog,
    json: bool,
) -> Result<()> {
    let monitor = ClusterMonitor::new(topology, client, log);
    let view = monitor.run_cycle().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&*view)?);
    } else {
        print!("{}", render::view(&view));
    }

    Ok(())
}

async fn watch(
    topology: ClusterTopology,
    client: NodeClient,
    log: PostgrestActivityLog,
) -> Result<()> {
    let monitor = ClusterMonitor::new(topology, client, log);
    let mut views = monitor.subscribe();

    monitor.start()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt signal");
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                print!("{}", render::view(&view));
            }
        }
    }

    monitor.shutdown().await;

    Ok(())
}
