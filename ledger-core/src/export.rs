//! Graph persistence
//!
//! The format is chosen from the output file's extension:
//! - `.dot` / `.gv`: Graphviz DOT, importable by Gephi
//! - `.json`: node-link JSON

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::{EdgeKind, GraphNode, RelationshipGraph};

/// Errors while persisting a graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported graph format: {0} (use .dot, .gv or .json)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Dot,
    Json,
}

impl GraphFormat {
    pub fn from_path(path: &Path) -> Result<Self, GraphError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "dot" | "gv" => Ok(GraphFormat::Dot),
            "json" => Ok(GraphFormat::Json),
            _ => Err(GraphError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Node-link document, one entry per node and per edge
#[derive(Debug, Serialize)]
pub struct NodeLinkGraph<'a> {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<NodeLinkNode<'a>>,
    pub links: Vec<NodeLinkEdge<'a>>,
}

#[derive(Debug, Serialize)]
pub struct NodeLinkNode<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub node_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct NodeLinkEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub kind: &'static str,
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl RelationshipGraph {
    /// Render as Graphviz DOT with `label`/`type` node attributes and `kind` edge attributes
    pub fn to_dot(&self) -> String {
        let config = [Config::NodeNoLabel, Config::EdgeNoLabel];
        let edge_attrs = |_: &DiGraph<GraphNode, EdgeKind>, edge: EdgeReference<'_, EdgeKind>| {
            format!("kind = {}", quote(edge.weight().label()))
        };
        let node_attrs = |_: &DiGraph<GraphNode, EdgeKind>, (_, node): (NodeIndex, &GraphNode)| {
            format!(
                "label = {} type = {}",
                quote(&node.id),
                quote(node.node_type.label())
            )
        };

        Dot::with_attr_getters(self.inner(), &config, &edge_attrs, &node_attrs).to_string()
    }

    pub fn to_node_link(&self) -> NodeLinkGraph<'_> {
        NodeLinkGraph {
            directed: true,
            multigraph: true,
            nodes: self
                .nodes()
                .map(|node| NodeLinkNode {
                    id: &node.id,
                    node_type: node.node_type.label(),
                })
                .collect(),
            links: self
                .edges()
                .map(|(source, target, kind)| NodeLinkEdge {
                    source,
                    target,
                    kind: kind.label(),
                })
                .collect(),
        }
    }

    /// Write the graph to `path` in the format its extension names
    pub fn write_to(&self, path: &Path) -> Result<GraphFormat, GraphError> {
        let format = GraphFormat::from_path(path)?;
        let mut out = BufWriter::new(File::create(path)?);

        match format {
            GraphFormat::Dot => out.write_all(self.to_dot().as_bytes())?,
            GraphFormat::Json => serde_json::to_writer_pretty(&mut out, &self.to_node_link())?,
        }

        out.flush()?;
        Ok(format)
    }
}
