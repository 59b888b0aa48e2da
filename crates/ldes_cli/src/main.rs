//! LDES Explorer CLI
//!
//! Walks the event stream behind an artifact and prints one JSON object
//! per member on stdout. Logs go to stderr.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use futures::StreamExt;
use ldes_core::ArtifactRef;
use ldes_explore::{Explorer, ExplorerConfig, ViewPolicy};
use ldes_query::SparqlEndpoint;
use ldes_transport::HttpTransport;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ldes")]
#[command(about = "Explore Linked Data Event Streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the members of the event stream an artifact belongs to
    Explore(ExploreArgs),
}

#[derive(clap::Args)]
struct ExploreArgs {
    /// Artifact URL
    url: String,
    /// SPARQL endpoint evaluating the explorer's queries
    #[arg(short, long, env = "LDES_SERVICE")]
    service: String,
    /// HTTP proxy for link discovery and queries
    #[arg(long, env = "LDES_PROXY")]
    proxy: Option<String>,
    /// Members materialized concurrently per page
    #[arg(long, default_value_t = 4)]
    prefetch: usize,
    /// Keep following the log, polling every N seconds
    #[arg(long, value_name = "SECS")]
    follow: Option<u64>,
    /// Walk every view instead of the first
    #[arg(long)]
    all_views: bool,
    /// Print the discovered stream and exit
    #[arg(long)]
    describe: bool,
    /// Stop after N members
    #[arg(long)]
    limit: Option<usize>,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl ExploreArgs {
    fn config(&self) -> ExplorerConfig {
        let mut config = ExplorerConfig::default().with_prefetch(self.prefetch);
        if self.all_views {
            config = config.with_view_policy(ViewPolicy::All);
        }
        if let Some(secs) = self.follow {
            config = config.with_follow(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ldes=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Explore(args) => explore(args).await,
    }
}

async fn explore(args: ExploreArgs) -> Result<()> {
    let timeout = Duration::from_secs(args.timeout);
    let transport = HttpTransport::with_settings(timeout, args.proxy.as_deref())?;
    let provider = SparqlEndpoint::with_settings(&args.service, timeout, args.proxy.as_deref())?;
    let explorer =
        Explorer::new(Arc::new(transport), Arc::new(provider)).with_config(args.config());
    let artifact = ArtifactRef::new(args.url.clone());

    let mut stdout = std::io::stdout().lock();
    if args.describe {
        let descriptor = explorer.discover(&artifact).await?;
        writeln!(stdout, "{}", serde_json::to_string_pretty(&descriptor)?)?;
        return Ok(());
    }

    let mut members = explorer.explore(artifact);
    let mut printed = 0usize;
    while let Some(member) = members.next().await {
        let member = member?;
        writeln!(stdout, "{}", serde_json::to_string(&member)?)?;
        stdout.flush()?;
        printed += 1;
        if args.limit.is_some_and(|limit| printed >= limit) {
            break;
        }
    }
    tracing::info!(members = printed, "done");
    Ok(())
}
