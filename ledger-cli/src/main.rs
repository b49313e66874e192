//! Hidden Ledger CLI
//!
//! Correlate a Bitcoin address's transactions with dark web mentions and
//! write the resulting relationship graph.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ledger_core::{
    validate_address, GraphFormat, DEFAULT_GRAPH_FILE, DEFAULT_MAX_PAGES, DEFAULT_MAX_REFINEMENTS,
};
use ledger_net::NetConfig;
use ledger_runtime::{Pipeline, PipelineConfig, PipelineOutcome};
use ledger_sources::{ExplorerConfig, SearchConfig};

#[derive(Parser)]
#[command(name = "hidden-ledger")]
#[command(author, version, about = "Collect and visualize Bitcoin transactions and related hidden services", long_about = None)]
struct Cli {
    /// A bitcoin address to begin the search on
    #[arg(short, long)]
    address: String,

    /// Output file for the graph (.dot, .gv or .json)
    #[arg(short, long, default_value = DEFAULT_GRAPH_FILE)]
    graph: PathBuf,

    /// Webhose API token (or set WEBHOSE_TOKEN env var)
    #[arg(long, env = "WEBHOSE_TOKEN", hide_env_values = true)]
    webhose_token: Option<String>,

    /// Proxy for all requests, e.g. socks5h://127.0.0.1:9050
    #[arg(long)]
    proxy: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Block explorer root URL
    #[arg(long, default_value = "https://blockexplorer.com")]
    explorer_url: String,

    /// Dark web search API root URL
    #[arg(long, default_value = "http://webhose.io")]
    search_url: String,

    /// Maximum block explorer windows to request
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: usize,

    /// Maximum refined searches per address
    #[arg(long, default_value_t = DEFAULT_MAX_REFINEMENTS)]
    max_refinements: usize,

    /// Extra site to exclude from searches and the graph (repeatable)
    #[arg(long = "exclude-site")]
    exclude_sites: Vec<String>,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let address = validate_address(&cli.address)?;

    // Fail on an unwritable format before spending any requests
    GraphFormat::from_path(&cli.graph)?;

    let token = cli.webhose_token.clone().unwrap_or_default();
    let search = SearchConfig {
        base_url: cli.search_url.clone(),
        max_refinements: cli.max_refinements,
        ..SearchConfig::default()
    }
    .with_token(&token);

    if !search.has_token() {
        anyhow::bail!("Webhose API token required. Set WEBHOSE_TOKEN or use --webhose-token");
    }

    let config = PipelineConfig {
        net: NetConfig {
            proxy: cli.proxy.clone(),
            ..NetConfig::default()
        }
        .with_timeout(cli.timeout),
        explorer: ExplorerConfig {
            base_url: cli.explorer_url.clone(),
            max_pages: cli.max_pages,
            ..ExplorerConfig::default()
        },
        search: SearchConfig {
            blacklist: search.blacklist.clone().with_sites(cli.exclude_sites.iter().cloned()),
            ..search
        },
    };

    run(&address, &cli.graph, config).await
}

async fn run(address: &str, graph_path: &Path, config: PipelineConfig) -> Result<()> {
    println!("Hidden Ledger - Bitcoin / dark web correlation\n");
    println!("Target:  {}", address);
    println!("Graph:   {}", graph_path.display());
    if let Some(proxy) = &config.net.proxy {
        println!("Proxy:   {}", proxy);
    }
    println!();

    let pipeline = Pipeline::new(config)?;

    match pipeline.run(address).await? {
        PipelineOutcome::NoTransactions => {
            println!("No transactions found.");
        }
        PipelineOutcome::Graph(report) => {
            let format = report.graph.write_to(graph_path)?;

            println!("Transactions:        {}", report.transactions);
            println!("Unique addresses:    {}", report.addresses);
            println!("Mentioned addresses: {}", report.addresses_with_mentions);
            println!("Hidden services:     {}", report.hidden_services);
            println!(
                "Graph:               {} nodes, {} edges ({:?})",
                report.graph.node_count(),
                report.graph.edge_count(),
                format
            );
            println!("Elapsed:             {}s", report.elapsed().num_seconds());
            println!("\nGraph saved to {}", graph_path.display());
            println!("Open the graph file in Gephi or similar for visualization.");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hidden-ledger", "--address", "1BoatSLRHtKNngkdXEeobR76b53LETtpyT"])
            .unwrap();
        assert_eq!(cli.graph, PathBuf::from(DEFAULT_GRAPH_FILE));
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(cli.max_refinements, DEFAULT_MAX_REFINEMENTS);
        assert_eq!(cli.verbose, 1);
        assert!(cli.exclude_sites.is_empty());
    }

    #[test]
    fn test_repeated_exclusions() {
        let cli = Cli::try_parse_from([
            "hidden-ledger",
            "-a",
            "1BoatSLRHtKNngkdXEeobR76b53LETtpyT",
            "--exclude-site",
            "a.onion",
            "--exclude-site",
            "b.onion",
            "-g",
            "out.json",
        ])
        .unwrap();
        assert_eq!(cli.exclude_sites, vec!["a.onion", "b.onion"]);
        assert_eq!(cli.graph, PathBuf::from("out.json"));
    }

    #[test]
    fn test_address_required() {
        assert!(Cli::try_parse_from(["hidden-ledger"]).is_err());
    }
}
