//! Block explorer source
//!
//! Retrieves the full transaction history of one address from an Insight-style
//! explorer API, one fixed-size window at a time.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ledger_core::{Transaction, TransactionPage, DEFAULT_MAX_PAGES, EXPLORER_WINDOW};
use ledger_net::{create_client, NetConfig};

use crate::{SharedTransactionSource, SourceError, TransactionSource};

/// Configuration for the block explorer
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Explorer root, without the `/api` suffix
    pub base_url: String,
    /// Transactions requested per window
    pub window: usize,
    /// Maximum windows requested per address
    pub max_pages: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blockexplorer.com".to_string(),
            window: EXPLORER_WINDOW,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Insight API client (`/api/addrs/{address}/txs?from=&to=`)
pub struct InsightExplorer {
    base_url: String,
    client: Client,
}

impl InsightExplorer {
    pub fn new(base_url: &str, net: &NetConfig) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: create_client(net)?,
        })
    }

    fn txs_url(&self, address: &str) -> String {
        format!("{}/api/addrs/{}/txs", self.base_url, address)
    }
}

#[async_trait]
impl TransactionSource for InsightExplorer {
    async fn fetch_window(
        &self,
        address: &str,
        from: usize,
        to: usize,
    ) -> Result<TransactionPage, SourceError> {
        let url = self.txs_url(address);
        debug!("Fetching {} transactions {}..{}", address, from, to);

        let response = self
            .client
            .get(&url)
            .query(&[("from", from), ("to", to)])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Block explorer request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                service: "Block explorer",
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Block explorer read failed: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            SourceError::Parse(format!("Failed to parse block explorer response: {}", e))
        })
    }

    fn name(&self) -> &str {
        "insight"
    }
}

/// Create a shared Insight explorer source
pub fn create_explorer(
    config: &ExplorerConfig,
    net: &NetConfig,
) -> Result<SharedTransactionSource, SourceError> {
    Ok(Arc::new(InsightExplorer::new(&config.base_url, net)?))
}

/// Walks an address's history window by window
pub struct TransactionFetcher {
    source: SharedTransactionSource,
    window: usize,
    max_pages: usize,
}

impl TransactionFetcher {
    pub fn new(source: SharedTransactionSource, config: &ExplorerConfig) -> Self {
        Self {
            source,
            window: config.window.max(1),
            max_pages: config.max_pages,
        }
    }

    /// Retrieve every transaction of `address`.
    ///
    /// Stops once the explorer's reported total is reached, when it reports
    /// nothing, or after `max_pages` windows. A response that cannot be used
    /// ends the walk and keeps what was collected; a transport failure is
    /// returned as an error.
    pub async fn fetch_all(&self, address: &str) -> Result<Vec<Transaction>, SourceError> {
        let mut transactions: Vec<Transaction> = Vec::new();
        let mut from = 0;
        let mut pages = 0;

        loop {
            if pages == self.max_pages {
                warn!(
                    "Stopped after {} explorer windows for {} ({} transactions retrieved)",
                    pages,
                    address,
                    transactions.len()
                );
                break;
            }
            pages += 1;

            let to = from + self.window;
            let page = match self.source.fetch_window(address, from, to).await {
                Ok(page) => page,
                Err(e) if e.is_unusable_response() => {
                    warn!("Error retrieving bitcoin transactions for {}: {}", address, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            if page.total_items == 0 {
                info!("No transactions for {}", address);
                break;
            }

            if page.items.is_empty() {
                warn!(
                    "{} returned an empty window at {} of {} reported transactions",
                    self.source.name(),
                    from,
                    page.total_items
                );
                break;
            }

            transactions.extend(page.items);

            if transactions.len() >= page.total_items {
                break;
            }

            from += self.window;
        }

        info!("Retrieved {} bitcoin transactions.", transactions.len());
        Ok(transactions)
    }
}
