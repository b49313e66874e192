//! Common traits for external data sources

use async_trait::async_trait;
use ledger_core::{SearchQuery, TransactionPage};
use ledger_net::NetError;
use std::sync::Arc;
use thiserror::Error;

use crate::SearchPage;

/// Errors from source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} returned status: {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Net(#[from] NetError),
}

impl SourceError {
    /// The service answered, but with nothing usable (bad status or body)
    pub fn is_unusable_response(&self) -> bool {
        matches!(self, SourceError::Status { .. } | SourceError::Parse(_))
    }
}

/// Paginated transaction listing for an address
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch transactions `from..to` of the address's history
    async fn fetch_window(
        &self,
        address: &str,
        from: usize,
        to: usize,
    ) -> Result<TransactionPage, SourceError>;

    /// Service name for diagnostics
    fn name(&self) -> &str;
}

/// Free-text search over indexed dark web content
#[async_trait]
pub trait MentionSearch: Send + Sync {
    /// Top page of hits for `query`, plus the index's total hit count
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, SourceError>;

    /// Service name for diagnostics
    fn name(&self) -> &str;
}

pub type SharedTransactionSource = Arc<dyn TransactionSource>;
pub type SharedMentionSearch = Arc<dyn MentionSearch>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unusable_response() {
        assert!(SourceError::Parse("bad json".into()).is_unusable_response());
        assert!(SourceError::Status { service: "explorer", status: 502 }.is_unusable_response());
        assert!(!SourceError::Network("connection reset".into()).is_unusable_response());
    }

    #[test]
    fn test_status_display() {
        let err = SourceError::Status { service: "Webhose", status: 429 };
        assert_eq!(err.to_string(), "Webhose returned status: 429");
    }
}
