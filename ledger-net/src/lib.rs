//! Hidden Ledger network layer
//!
//! Builds the HTTP clients used against the block explorer and the dark web
//! search index:
//! - Request timeouts
//! - Optional SOCKS5h / HTTP proxy (e.g. a local Tor daemon)
//! - User-agent rotation

pub mod client;

pub use client::*;
