//! Correlation Pipeline
//!
//! Runs one investigation strictly in order, one request at a time:
//! - Fetch the target's full transaction history
//! - Extract every counterpart address
//! - Discover hidden services mentioning each address
//! - Assemble the typed relationship graph
//!
//! Nothing is persisted between stages; a transport failure aborts the run
//! and discards whatever was collected.

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;

use ledger_core::{extract_unique_addresses, Blacklist, GraphBuilder, RelationshipGraph};
use ledger_net::NetConfig;
use ledger_sources::{
    create_explorer, create_search, DarkWebCorrelator, ExplorerConfig, SearchConfig,
    SharedMentionSearch, SharedTransactionSource, TransactionFetcher,
};

/// Pipeline configuration, built once at startup
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// HTTP client settings shared by both services
    pub net: NetConfig,
    /// Block explorer settings
    pub explorer: ExplorerConfig,
    /// Dark web search settings
    pub search: SearchConfig,
}

/// Result of one investigation
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The explorer had no transactions for the target; nothing was searched
    NoTransactions,
    /// The finished graph
    Graph(RunReport),
}

#[derive(Debug)]
pub struct RunReport {
    pub target: String,
    pub graph: RelationshipGraph,
    pub transactions: usize,
    pub addresses: usize,
    pub addresses_with_mentions: usize,
    pub hidden_services: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// The correlation pipeline
pub struct Pipeline {
    fetcher: TransactionFetcher,
    correlator: DarkWebCorrelator,
    blacklist: Blacklist,
}

impl Pipeline {
    /// Create a pipeline against the live block explorer and search API
    pub fn new(config: PipelineConfig) -> Result<Self, anyhow::Error> {
        let explorer = create_explorer(&config.explorer, &config.net)?;
        let search = create_search(&config.search, &config.net)?;
        Ok(Self::with_sources(explorer, search, &config))
    }

    /// Create a pipeline over the given sources
    pub fn with_sources(
        explorer: SharedTransactionSource,
        search: SharedMentionSearch,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            fetcher: TransactionFetcher::new(explorer, &config.explorer),
            correlator: DarkWebCorrelator::new(search, &config.search),
            blacklist: config.search.blacklist.clone(),
        }
    }

    /// Investigate `target`
    pub async fn run(&self, target: &str) -> anyhow::Result<PipelineOutcome> {
        let started_at = Utc::now();

        info!("Retrieving all transactions from the blockchain for {}", target);
        let transactions = self
            .fetcher
            .fetch_all(target)
            .await
            .with_context(|| format!("Failed to retrieve transactions for {}", target))?;

        if transactions.is_empty() {
            info!("No transactions found for {}", target);
            return Ok(PipelineOutcome::NoTransactions);
        }

        let addresses = extract_unique_addresses(&transactions);
        info!("Identified {} unique bitcoin addresses.", addresses.len());

        let mentions = self
            .correlator
            .correlate(&addresses)
            .await
            .context("Dark web search failed")?;

        let graph = GraphBuilder::build(target, &transactions, &mentions, &self.blacklist);
        info!(
            "Graph has {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(PipelineOutcome::Graph(RunReport {
            target: target.to_string(),
            transactions: transactions.len(),
            addresses: addresses.len(),
            addresses_with_mentions: mentions.len(),
            hidden_services: mentions.distinct_sites(),
            graph,
            started_at,
            finished_at: Utc::now(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_core::{
        EdgeKind, NodeType, ScriptPubKey, SearchQuery, Transaction, TransactionPage, TxInput,
        TxOutput,
    };
    use ledger_sources::{
        DarkPost, MentionSearch, PostSource, SearchPage, SourceError, TransactionSource,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct MockExplorer {
        transactions: Vec<Transaction>,
    }

    #[async_trait]
    impl TransactionSource for MockExplorer {
        async fn fetch_window(
            &self,
            _address: &str,
            from: usize,
            to: usize,
        ) -> Result<TransactionPage, SourceError> {
            let end = to.min(self.transactions.len());
            Ok(TransactionPage {
                total_items: self.transactions.len(),
                items: self.transactions.get(from..end).unwrap_or_default().to_vec(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Returns fixed sites per address and counts searches per term
    struct MockSearch {
        sites: HashMap<String, Vec<String>>,
        fail: bool,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl MockSearch {
        fn new() -> Self {
            Self {
                sites: HashMap::new(),
                fail: false,
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn with_sites(mut self, address: &str, sites: &[&str]) -> Self {
            self.sites
                .insert(address.to_string(), sites.iter().map(|s| s.to_string()).collect());
            self
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        fn calls_for(&self, address: &str) -> usize {
            self.calls.lock().unwrap().get(address).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl MentionSearch for MockSearch {
        async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError> {
            *self
                .calls
                .lock()
                .unwrap()
                .entry(query.term().to_string())
                .or_default() += 1;

            if self.fail {
                return Err(SourceError::Network("connection reset".into()));
            }

            let sites = self.sites.get(query.term()).cloned().unwrap_or_default();
            Ok(SearchPage {
                total_results: sites.len() as u64,
                darkposts: sites
                    .into_iter()
                    .map(|site| DarkPost {
                        source: Some(PostSource { site: Some(site) }),
                    })
                    .collect(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn transfer(sender: Option<&str>, recipients: &[&str]) -> Transaction {
        Transaction {
            txid: None,
            vin: vec![TxInput {
                addr: sender.map(str::to_string),
            }],
            vout: recipients
                .iter()
                .map(|addr| TxOutput {
                    script_pub_key: Some(ScriptPubKey {
                        addresses: vec![addr.to_string()],
                    }),
                })
                .collect(),
        }
    }

    fn pipeline(transactions: Vec<Transaction>, search: Arc<MockSearch>) -> Pipeline {
        Pipeline::with_sources(
            Arc::new(MockExplorer { transactions }),
            search,
            &PipelineConfig::default(),
        )
    }

    fn report(outcome: PipelineOutcome) -> RunReport {
        match outcome {
            PipelineOutcome::Graph(report) => report,
            PipelineOutcome::NoTransactions => panic!("expected a graph"),
        }
    }

    #[tokio::test]
    async fn test_single_transaction_graph() {
        let search = Arc::new(MockSearch::new());
        let outcome = pipeline(vec![transfer(Some("A"), &["B"])], search.clone())
            .run("A")
            .await
            .unwrap();

        let report = report(outcome);
        let graph = &report.graph;
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_type("A"), Some(NodeType::TargetAddress));
        assert_eq!(graph.node_type("B"), Some(NodeType::Wallet));
        assert_eq!(graph.count_edges("A", "B", EdgeKind::FundFlow), 1);

        assert_eq!(report.transactions, 1);
        assert_eq!(report.addresses, 2);
        assert_eq!(report.addresses_with_mentions, 0);
        assert!(report.elapsed() >= chrono::Duration::zero());
    }

    #[tokio::test]
    async fn test_no_transactions_skips_search() {
        let search = Arc::new(MockSearch::new().with_sites("A", &["x.onion"]));
        let outcome = pipeline(Vec::new(), search.clone()).run("A").await.unwrap();

        assert!(matches!(outcome, PipelineOutcome::NoTransactions));
        assert_eq!(search.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_small_result_sets_search_once_per_address() {
        let search = Arc::new(
            MockSearch::new()
                .with_sites("A", &["forum.onion", "market.onion"])
                .with_sites("C", &["market.onion", "blockchainbdgpzk.onion"]),
        );
        let txs = vec![
            transfer(Some("A"), &["B", "C"]),
            transfer(Some("C"), &["A"]),
        ];

        let report = report(pipeline(txs, search.clone()).run("A").await.unwrap());

        for address in ["A", "B", "C"] {
            assert_eq!(search.calls_for(address), 1, "address {}", address);
        }
        assert_eq!(search.total_calls(), 3);

        let graph = &report.graph;
        assert_eq!(graph.node_type("market.onion"), Some(NodeType::HiddenService));
        assert!(graph.node("blockchainbdgpzk.onion").is_none());
        assert_eq!(graph.count_edges("C", "market.onion", EdgeKind::Mention), 1);
        assert_eq!(graph.node_type("A"), Some(NodeType::TargetAddress));
        assert_eq!(graph.node_type("C"), Some(NodeType::Address));
        assert_eq!(report.addresses_with_mentions, 2);
        assert_eq!(report.hidden_services, 2);
    }

    #[tokio::test]
    async fn test_one_pipeline_many_targets() {
        let search = Arc::new(MockSearch::new());
        let pipeline = pipeline(vec![transfer(Some("A"), &["B"])], search.clone());

        let first = report(pipeline.run("A").await.unwrap());
        let second = report(pipeline.run("B").await.unwrap());

        assert_eq!(first.target, "A");
        assert_eq!(first.graph.node_type("A"), Some(NodeType::TargetAddress));
        assert_eq!(second.target, "B");
        assert_eq!(second.graph.node_type("A"), Some(NodeType::Address));
        assert_eq!(second.graph.node_type("B"), Some(NodeType::TargetWallet));
        assert_eq!(search.total_calls(), 4);
    }

    #[tokio::test]
    async fn test_search_transport_failure_aborts() {
        let search = Arc::new(MockSearch {
            fail: true,
            ..MockSearch::new()
        });
        let result = pipeline(vec![transfer(Some("A"), &["B"])], search)
            .run("A")
            .await;

        assert!(result.is_err());
    }
}
