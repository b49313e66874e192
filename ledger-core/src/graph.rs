//! Typed relationship graph
//!
//! Nodes are bitcoin addresses or hidden service sites, each carrying exactly
//! one [`NodeType`]. Edges are either fund flows (sender -> recipient) or
//! mentions (address -> site). Edges are never deduplicated: a relation that
//! repeats across transactions yields one edge per occurrence.

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{Blacklist, HiddenServiceMentions, Transaction};

/// Whether an address is the investigated one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    Target,
    Counterpart,
}

impl NodeRole {
    pub fn of(id: &str, target: &str) -> Self {
        if id == target {
            NodeRole::Target
        } else {
            NodeRole::Counterpart
        }
    }

    /// Type for an address seen on the sending side
    pub fn sender_type(self) -> NodeType {
        match self {
            NodeRole::Target => NodeType::TargetAddress,
            NodeRole::Counterpart => NodeType::Address,
        }
    }

    /// Type for an address seen on the receiving side
    pub fn recipient_type(self) -> NodeType {
        match self {
            NodeRole::Target => NodeType::TargetWallet,
            NodeRole::Counterpart => NodeType::Wallet,
        }
    }
}

/// Node type label written to the `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    TargetAddress,
    Address,
    TargetWallet,
    Wallet,
    HiddenService,
}

impl NodeType {
    /// Human-readable label used in exported graphs
    pub fn label(self) -> &'static str {
        match self {
            NodeType::TargetAddress => "Target Bitcoin Address",
            NodeType::Address => "Bitcoin Address",
            NodeType::TargetWallet => "Target Bitcoin Wallet",
            NodeType::Wallet => "Bitcoin Wallet",
            NodeType::HiddenService => "Hidden Service",
        }
    }

    // Higher wins when an id is inserted again with a different type
    fn precedence(self) -> u8 {
        match self {
            NodeType::TargetAddress => 4,
            NodeType::TargetWallet => 3,
            NodeType::Address => 2,
            NodeType::Wallet => 1,
            NodeType::HiddenService => 0,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Funds moved from sender to recipient
    FundFlow,
    /// Address was mentioned on a hidden service
    Mention,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            EdgeKind::FundFlow => "fund_flow",
            EdgeKind::Mention => "mention",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Address or site identifier, unique within the graph
    pub id: String,
    pub node_type: NodeType,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Directed graph of addresses and hidden services
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    graph: DiGraph<GraphNode, EdgeKind>,
    node_indices: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or retype an existing one if `node_type` takes precedence
    pub fn upsert_node(&mut self, id: &str, node_type: NodeType) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(id) {
            let node = &mut self.graph[idx];
            if node_type.precedence() > node.node_type.precedence() {
                node.node_type = node_type;
            }
            return idx;
        }

        let idx = self.graph.add_node(GraphNode {
            id: id.to_string(),
            node_type,
        });
        self.node_indices.insert(id.to_string(), idx);
        idx
    }

    /// Existing node index, or a new node of type `fallback`
    fn node_or_insert(&mut self, id: &str, fallback: NodeType) -> NodeIndex {
        match self.node_indices.get(id) {
            Some(&idx) => idx,
            None => self.upsert_node(id, fallback),
        }
    }

    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) {
        self.graph.add_edge(from, to, kind);
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn node_type(&self, id: &str) -> Option<NodeType> {
        self.node(id).map(|n| n.node_type)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Edges as (source id, target id, kind), in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, EdgeKind)> {
        self.graph.raw_edges().iter().map(|edge| {
            (
                self.graph[edge.source()].id.as_str(),
                self.graph[edge.target()].id.as_str(),
                edge.weight,
            )
        })
    }

    /// Number of edges `from -> to` of the given kind
    pub fn count_edges(&self, from: &str, to: &str, kind: EdgeKind) -> usize {
        self.edges()
            .filter(|&(f, t, k)| f == from && t == to && k == kind)
            .count()
    }

    pub fn inner(&self) -> &DiGraph<GraphNode, EdgeKind> {
        &self.graph
    }
}

/// Assembles the relationship graph for one investigated address
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    target: String,
    blacklist: Blacklist,
    graph: RelationshipGraph,
}

impl GraphBuilder {
    pub fn new(target: &str, blacklist: Blacklist) -> Self {
        Self {
            target: target.to_string(),
            blacklist,
            graph: RelationshipGraph::new(),
        }
    }

    fn role(&self, id: &str) -> NodeRole {
        NodeRole::of(id, &self.target)
    }

    /// Add the fund flows of one transaction. Transactions without a sender
    /// are skipped. Returns the number of edges added.
    pub fn add_transaction(&mut self, tx: &Transaction) -> usize {
        let Some(sender) = tx.sender() else {
            return 0;
        };

        let sender_type = self.role(sender).sender_type();
        let from = self.graph.upsert_node(sender, sender_type);

        let mut added = 0;
        for recipient in tx.recipients() {
            let recipient_type = self.role(recipient).recipient_type();
            let to = self.graph.upsert_node(recipient, recipient_type);
            self.graph.add_edge(from, to, EdgeKind::FundFlow);
            added += 1;
        }
        added
    }

    /// Add hidden service nodes and mention edges, dropping blacklisted sites.
    /// Returns the number of edges added.
    pub fn add_mentions(&mut self, mentions: &HiddenServiceMentions) -> usize {
        let blacklist = &self.blacklist;
        let mut added = 0;
        for (address, sites) in mentions.iter() {
            // Only reached without a node when every transaction naming it lacked a sender
            let fallback = NodeRole::of(address, &self.target).recipient_type();
            for site in sites.iter().filter(|s| !blacklist.contains(s)) {
                let from = self.graph.node_or_insert(address, fallback);
                let to = self.graph.upsert_node(site, NodeType::HiddenService);
                self.graph.add_edge(from, to, EdgeKind::Mention);
                added += 1;
            }
        }
        added
    }

    pub fn finish(self) -> RelationshipGraph {
        self.graph
    }

    /// Build the whole graph in one call
    pub fn build(
        target: &str,
        transactions: &[Transaction],
        mentions: &HiddenServiceMentions,
        blacklist: &Blacklist,
    ) -> RelationshipGraph {
        let mut builder = Self::new(target, blacklist.clone());
        for tx in transactions {
            builder.add_transaction(tx);
        }
        builder.add_mentions(mentions);
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_transfer_from_target() {
        let txs = vec![Transaction::simple(Some("A"), &["B"])];
        let graph = GraphBuilder::build("A", &txs, &HiddenServiceMentions::new(), &Blacklist::default());

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_type("A"), Some(NodeType::TargetAddress));
        assert_eq!(graph.node_type("B"), Some(NodeType::Wallet));
        assert_eq!(graph.count_edges("A", "B", EdgeKind::FundFlow), 1);
    }

    #[test]
    fn test_target_sender_wins_over_earlier_wallet() {
        let txs = vec![
            Transaction::simple(Some("X"), &["T"]),
            Transaction::simple(Some("T"), &["Y"]),
        ];
        let graph = GraphBuilder::build("T", &txs, &HiddenServiceMentions::new(), &Blacklist::default());

        assert_eq!(graph.node_type("T"), Some(NodeType::TargetAddress));
        assert_eq!(graph.node_type("X"), Some(NodeType::Address));
        assert_eq!(graph.node_type("Y"), Some(NodeType::Wallet));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_target_as_recipient_only() {
        let txs = vec![Transaction::simple(Some("X"), &["T"])];
        let graph = GraphBuilder::build("T", &txs, &HiddenServiceMentions::new(), &Blacklist::default());
        assert_eq!(graph.node_type("T"), Some(NodeType::TargetWallet));
    }

    #[test]
    fn test_counterpart_sender_keeps_address_type() {
        let txs = vec![
            Transaction::simple(Some("X"), &["Y"]),
            Transaction::simple(Some("Y"), &["X"]),
        ];
        let graph = GraphBuilder::build("T", &txs, &HiddenServiceMentions::new(), &Blacklist::default());
        assert_eq!(graph.node_type("X"), Some(NodeType::Address));
        assert_eq!(graph.node_type("Y"), Some(NodeType::Address));
    }

    #[test]
    fn test_repeated_edges_are_kept() {
        let txs = vec![
            Transaction::simple(Some("A"), &["B"]),
            Transaction::simple(Some("A"), &["B", "B"]),
        ];
        let graph = GraphBuilder::build("A", &txs, &HiddenServiceMentions::new(), &Blacklist::default());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.count_edges("A", "B", EdgeKind::FundFlow), 3);
    }

    #[test]
    fn test_senderless_transaction_skipped() {
        let txs = vec![Transaction::simple(None, &["B"])];
        let graph = GraphBuilder::build("A", &txs, &HiddenServiceMentions::new(), &Blacklist::default());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_mentions_skip_blacklist() {
        let txs = vec![Transaction::simple(Some("A"), &["B"])];
        let mut mentions = HiddenServiceMentions::new();
        mentions.insert("B", "market.onion");
        mentions.insert("B", "blockchainbdgpzk.onion");
        mentions.insert("A", "market.onion");

        let graph = GraphBuilder::build("A", &txs, &mentions, &Blacklist::default());

        assert_eq!(graph.node_type("market.onion"), Some(NodeType::HiddenService));
        assert!(graph.node("blockchainbdgpzk.onion").is_none());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.count_edges("B", "market.onion", EdgeKind::Mention), 1);
        assert_eq!(graph.count_edges("A", "market.onion", EdgeKind::Mention), 1);
        assert_eq!(graph.node_type("A"), Some(NodeType::TargetAddress));
    }

    #[test]
    fn test_mention_for_address_without_node() {
        let mut mentions = HiddenServiceMentions::new();
        mentions.insert("C", "forum.onion");

        let graph = GraphBuilder::build("A", &[], &mentions, &Blacklist::default());
        assert_eq!(graph.node_type("C"), Some(NodeType::Wallet));
        assert_eq!(graph.edge_count(), 1);
    }
}
