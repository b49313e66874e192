//! Hidden Ledger Core - Domain model for Bitcoin / dark web correlation
//!
//! This crate provides the foundational primitives:
//! - Block-explorer transaction records and address extraction
//! - Hidden service mentions and the noise-site blacklist
//! - Structured dark web search queries
//! - The typed relationship graph and its exporters

pub mod transaction;
pub mod addresses;
pub mod mentions;
pub mod query;
pub mod graph;
pub mod export;

pub use transaction::*;
pub use addresses::*;
pub use mentions::*;
pub use query::*;
pub use graph::*;
pub use export::*;

/// Transactions requested per block-explorer window
pub const EXPLORER_WINDOW: usize = 50;

/// Default cap on block-explorer windows per address
pub const DEFAULT_MAX_PAGES: usize = 2000;

/// Hits returned per dark web search page
pub const SEARCH_PAGE_SIZE: u64 = 10;

/// Default cap on refined queries per address
pub const DEFAULT_MAX_REFINEMENTS: usize = 100;

/// Default output path for the relationship graph
pub const DEFAULT_GRAPH_FILE: &str = "bitcoingraph.dot";
