//! Hidden Ledger Runtime
//!
//! Wires the sources and the graph builder into a single sequential
//! correlation run.

pub mod pipeline;

pub use pipeline::*;
