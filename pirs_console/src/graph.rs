/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Structure graphs: tree and heap snapshots as plain node/edge data.
//!
//! A [`StructureGraph`] is an arena: nodes live in a `Vec` in the order
//! the service sent them, and an id → index map gives O(1) lookup.
//! Edges are `(from, to, side)` triples referring to node ids. Graphs
//! are immutable once built; a new fetch produces a new graph.
//!
//! For heap snapshots, the position of a node in `nodes` *is* its heap
//! index (children at `2i+1` and `2i+2`), so edges are informational.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Identifier of a node within one graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// A node of a structure snapshot.
///
/// Heap endpoints send `{id, label, value, ...}`; the BST endpoint
/// sends `{id, sku, days_remaining, ...}`. Both decode here; any other
/// keys are kept in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default, alias = "sku")]
    pub label: Option<String>,
    #[serde(default, alias = "days_remaining")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
            value,
            metadata: Map::new(),
        }
    }

    /// Label for display, falling back to the node id.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    /// A string-valued metadata field, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Which child slot an edge occupies in a binary tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// A directed parent → child edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default)]
    pub side: Option<Side>,
}

impl GraphEdge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, side: Option<Side>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            side,
        }
    }
}

/// Wire form of a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Immutable node/edge snapshot of a tree or heap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawGraph", into = "RawGraph")]
pub struct StructureGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<NodeId, usize>,
}

impl From<RawGraph> for StructureGraph {
    fn from(raw: RawGraph) -> Self {
        StructureGraph::new(raw.nodes, raw.edges)
    }
}

impl From<StructureGraph> for RawGraph {
    fn from(graph: StructureGraph) -> Self {
        RawGraph {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

impl StructureGraph {
    /// Build a graph. Duplicate node ids keep their first occurrence.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        let mut kept = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                tracing::debug!(id = %node.id, "dropping duplicate graph node");
                continue;
            }
            index.insert(node.id.clone(), kept.len());
            kept.push(node);
        }
        Self {
            nodes: kept,
            edges,
            index,
        }
    }

    /// Build the implicit-index heap graph for a sequence of labels.
    ///
    /// Node `i` gets id `node-{i}` and an edge from its parent
    /// `(i - 1) / 2`, matching the service's debug endpoints.
    pub fn heap_from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: Vec<GraphNode> = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| GraphNode::new(format!("node-{}", i), label, None))
            .collect();
        let edges = (1..nodes.len())
            .map(|i| {
                let side = if i % 2 == 1 { Side::Left } else { Side::Right };
                GraphEdge::new(
                    format!("node-{}", (i - 1) / 2),
                    format!("node-{}", i),
                    Some(side),
                )
            })
            .collect();
        StructureGraph::new(nodes, edges)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Arena index of a node (its heap index for heap graphs).
    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Left/right children per parent, for tree layout.
    ///
    /// Edges without a side fill the first free slot (left, then
    /// right). A second edge for an occupied slot is ignored, as are
    /// edges that reference unknown nodes.
    pub fn binary_children(&self) -> HashMap<&NodeId, (Option<&NodeId>, Option<&NodeId>)> {
        let mut children: HashMap<&NodeId, (Option<&NodeId>, Option<&NodeId>)> = HashMap::new();
        for edge in &self.edges {
            if !self.index.contains_key(&edge.from) || !self.index.contains_key(&edge.to) {
                continue;
            }
            let slot = children.entry(&edge.from).or_default();
            match edge.side {
                Some(Side::Left) if slot.0.is_none() => slot.0 = Some(&edge.to),
                Some(Side::Right) if slot.1.is_none() => slot.1 = Some(&edge.to),
                None if slot.0.is_none() => slot.0 = Some(&edge.to),
                None if slot.1.is_none() => slot.1 = Some(&edge.to),
                _ => {
                    tracing::debug!(from = %edge.from, to = %edge.to, "ignoring extra child edge");
                }
            }
        }
        children
    }

    /// The tree root: the first node (in input order) with no incoming
    /// edge, falling back to the first node.
    pub fn root(&self) -> Option<&GraphNode> {
        let has_incoming: std::collections::HashSet<&NodeId> =
            self.edges.iter().map(|e| &e.to).collect();
        self.nodes
            .iter()
            .find(|n| !has_incoming.contains(&n.id))
            .or_else(|| self.nodes.first())
    }
}
