//! Dark web mention discovery
//!
//! The search index (Webhose `darkFilter`) only ever returns its top page of
//! hits plus a total count; there is no offset or cursor. To reach the rest,
//! each follow-up query negates every site seen so far (`-site:`), which
//! pushes unseen sites onto the first page. Refinement repeats until the
//! remaining total fits on one page.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ledger_core::{
    Blacklist, HiddenServiceMentions, SearchQuery, DEFAULT_MAX_REFINEMENTS, SEARCH_PAGE_SIZE,
};
use ledger_net::{create_client, NetConfig};

use crate::{MentionSearch, SharedMentionSearch, SourceError};

/// Configuration for the dark web search
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search API root
    pub base_url: String,
    /// Webhose API token
    pub token: String,
    /// Hits per result page
    pub page_size: u64,
    /// Maximum refined queries per address
    pub max_refinements: usize,
    /// Sites excluded from every query and from the results
    pub blacklist: Blacklist,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "http://webhose.io".to_string(),
            token: String::new(),
            page_size: SEARCH_PAGE_SIZE,
            max_refinements: DEFAULT_MAX_REFINEMENTS,
            blacklist: Blacklist::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.trim().to_string();
        self
    }

    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

/// One page of search hits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "totalResults", default)]
    pub total_results: u64,
    #[serde(default)]
    pub darkposts: Vec<DarkPost>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DarkPost {
    #[serde(default)]
    pub source: Option<PostSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostSource {
    #[serde(default)]
    pub site: Option<String>,
}

impl SearchPage {
    /// Site of every hit that names one, in ranking order
    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.darkposts
            .iter()
            .filter_map(|post| post.source.as_ref()?.site.as_deref())
            .filter(|site| !site.is_empty())
    }
}

/// Webhose dark web API client
pub struct WebhoseSearch {
    base_url: String,
    token: String,
    client: Client,
}

impl WebhoseSearch {
    pub fn new(config: &SearchConfig, net: &NetConfig) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client: create_client(net)?,
        })
    }
}

#[async_trait]
impl MentionSearch for WebhoseSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError> {
        let q = query.render();
        debug!("Webhose query: {}", q);

        let response = self
            .client
            .get(format!("{}/darkFilter", self.base_url))
            .query(&[("token", self.token.as_str()), ("format", "json"), ("q", q.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Webhose request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                service: "Webhose",
                status: response.status().as_u16(),
            });
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse Webhose response: {}", e)))
    }

    fn name(&self) -> &str {
        "webhose"
    }
}

/// Create a shared Webhose search source
pub fn create_search(config: &SearchConfig, net: &NetConfig) -> Result<SharedMentionSearch, SourceError> {
    Ok(Arc::new(WebhoseSearch::new(config, net)?))
}

/// Finds the hidden services that mention each address
pub struct DarkWebCorrelator {
    search: SharedMentionSearch,
    page_size: u64,
    max_refinements: usize,
    blacklist: Blacklist,
}

impl DarkWebCorrelator {
    pub fn new(search: SharedMentionSearch, config: &SearchConfig) -> Self {
        Self {
            search,
            page_size: config.page_size,
            max_refinements: config.max_refinements,
            blacklist: config.blacklist.clone(),
        }
    }

    /// Search every address in turn. Addresses without any non-blacklisted
    /// hit are left out of the result.
    pub async fn correlate(&self, addresses: &[String]) -> Result<HiddenServiceMentions, SourceError> {
        let mut mentions = HiddenServiceMentions::new();

        for (i, address) in addresses.iter().enumerate() {
            info!("Searching {} of {} bitcoin addresses.", i + 1, addresses.len());

            let sites = self.discover(address).await?;
            for site in &sites {
                mentions.insert(address, site);
            }

            if !sites.is_empty() {
                info!(
                    "Discovered {} hidden services connected to {}",
                    sites.len(),
                    address
                );
            }
        }

        Ok(mentions)
    }

    /// Sites mentioning `address`, in discovery order, blacklist removed
    pub async fn discover(&self, address: &str) -> Result<Vec<String>, SourceError> {
        let mut found: Vec<String> = Vec::new();
        let mut query = SearchQuery::new(address);
        let mut refinements = 0;

        loop {
            let page = self.search.search(&query).await?;
            debug!(
                "{} hits for {} ({} exclusions)",
                page.total_results,
                address,
                query.exclusions().len()
            );

            if page.total_results == 0 {
                break;
            }

            for site in page.sites() {
                if !self.blacklist.contains(site) && !found.iter().any(|s| s == site) {
                    found.push(site.to_string());
                }
            }

            if page.total_results <= self.page_size {
                break;
            }

            if refinements == self.max_refinements {
                warn!(
                    "Stopped refining {} after {} queries with {} hits outstanding",
                    address,
                    refinements + 1,
                    page.total_results
                );
                break;
            }

            let next = SearchQuery::refined(address, found.iter().map(String::as_str), &self.blacklist);
            if next == query {
                warn!(
                    "{} keeps reporting {} hits for {} with no new sites, stopping",
                    self.search.name(),
                    page.total_results,
                    address
                );
                break;
            }

            query = next;
            refinements += 1;
        }

        Ok(found)
    }
}
