/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Layout of structure graphs into 2D drawing coordinates.
//!
//! [`layout`] is a pure function: the same graph and mode always yield
//! the same [`Layout`]. Coordinates are in abstract drawing units
//! (the browser dashboard used pixels); renderers scale them into
//! their viewport using [`Layout::extent`].
//!
//! Two modes:
//!
//! - [`LayoutMode::Bst`] walks the tree in order from the root and
//!   hands out one horizontal slot per node, so x strictly increases
//!   along the in-order sequence. y is proportional to depth.
//! - [`LayoutMode::Heap`] ignores edges and places node `i` purely
//!   from its index: depth `floor(log2(i + 1))`, with each level
//!   dividing the width of the deepest level evenly. Every parent ends
//!   up centered over its two child slots.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::graph::GraphEdge;
use crate::graph::NodeId;
use crate::graph::StructureGraph;

/// Horizontal distance between consecutive in-order BST slots.
pub const NODE_SPACING: f64 = 100.0;
/// Vertical distance between tree levels (both modes).
pub const LEVEL_HEIGHT: f64 = 80.0;
/// Left margin of the BST drawing.
pub const MARGIN_X: f64 = 60.0;
/// Top margin of the BST drawing.
pub const MARGIN_Y: f64 = 40.0;
/// Width of one slot on the deepest heap level.
pub const HEAP_SLOT_WIDTH: f64 = 90.0 * 1.4;
/// Top margin of the heap drawing.
pub const HEAP_MARGIN_Y: f64 = 30.0;

/// Which shape to lay a graph out as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutMode {
    #[default]
    Heap,
    Bst,
}

impl LayoutMode {
    pub fn toggle(self) -> Self {
        match self {
            LayoutMode::Heap => LayoutMode::Bst,
            LayoutMode::Bst => LayoutMode::Heap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Where one node was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: NodeId,
    pub position: Position,
    pub depth: usize,
}

/// Result of [`layout`].
///
/// Placements are kept in placement order: in-order for BST, index
/// order for heaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    placements: Vec<Placement>,
    index: HashMap<NodeId, usize>,
    extent: (f64, f64),
}

impl Layout {
    fn push(&mut self, id: &NodeId, position: Position, depth: usize) {
        self.index.insert(id.clone(), self.placements.len());
        self.placements.push(Placement {
            id: id.clone(),
            position,
            depth,
        });
    }

    fn finish(mut self, margin_x: f64, margin_y: f64) -> Self {
        let max_x = self
            .placements
            .iter()
            .map(|p| p.position.x)
            .fold(0.0_f64, f64::max);
        let max_y = self
            .placements
            .iter()
            .map(|p| p.position.y)
            .fold(0.0_f64, f64::max);
        self.extent = if self.placements.is_empty() {
            (0.0, 0.0)
        } else {
            (max_x + margin_x, max_y + margin_y)
        };
        self
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.index.get(id).map(|&i| self.placements[i].position)
    }

    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).map(|&i| self.placements[i].depth)
    }

    /// `(width, height)` of the drawing including margins.
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    /// Each edge of `graph` with both endpoint positions. Edges with an
    /// endpoint that was not placed are skipped.
    pub fn edges_with_positions<'a>(
        &self,
        graph: &'a StructureGraph,
    ) -> Vec<(&'a GraphEdge, Position, Position)> {
        graph
            .edges()
            .iter()
            .filter_map(|edge| {
                let from = self.position(&edge.from)?;
                let to = self.position(&edge.to)?;
                Some((edge, from, to))
            })
            .collect()
    }
}

/// Lay out `graph` as `mode`. An empty graph yields an empty layout.
pub fn layout(graph: &StructureGraph, mode: LayoutMode) -> Layout {
    match mode {
        LayoutMode::Bst => layout_bst(graph),
        LayoutMode::Heap => layout_heap(graph),
    }
}

/// Build the implicit-index heap graph for `labels`.
pub fn heap_graph_from_sequence<I, S>(labels: I) -> StructureGraph
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StructureGraph::heap_from_labels(labels)
}

fn layout_bst(graph: &StructureGraph) -> Layout {
    let mut out = Layout::default();
    let Some(root) = graph.root() else {
        return out;
    };
    let children = graph.binary_children();
    let left_of = |id: &NodeId| children.get(id).and_then(|c| c.0);
    let right_of = |id: &NodeId| children.get(id).and_then(|c| c.1);

    // Iterative in-order walk; `visited` stops malformed (cyclic) input
    // from re-entering a node.
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut stack: Vec<(&NodeId, usize)> = Vec::new();
    let mut current = Some((&root.id, 0usize));
    let mut slot = 0usize;
    loop {
        while let Some((id, depth)) = current {
            if !visited.insert(id) {
                tracing::warn!(node = %id, "cycle in tree structure; node already placed");
                current = None;
                continue;
            }
            stack.push((id, depth));
            current = left_of(id).map(|l| (l, depth + 1));
        }
        let Some((id, depth)) = stack.pop() else {
            break;
        };
        let position = Position {
            x: slot as f64 * NODE_SPACING + MARGIN_X,
            y: depth as f64 * LEVEL_HEIGHT + MARGIN_Y,
        };
        out.push(id, position, depth);
        slot += 1;
        current = right_of(id).map(|r| (r, depth + 1));
    }

    if out.len() < graph.len() {
        tracing::debug!(
            placed = out.len(),
            total = graph.len(),
            "nodes unreachable from the tree root were not placed"
        );
    }
    out.finish(MARGIN_X, MARGIN_Y)
}

/// Depth of heap index `i`: `floor(log2(i + 1))`.
pub fn heap_depth(i: usize) -> usize {
    (i + 1).ilog2() as usize
}

fn layout_heap(graph: &StructureGraph) -> Layout {
    let mut out = Layout::default();
    let n = graph.len();
    if n == 0 {
        return out;
    }
    let max_depth = heap_depth(n - 1);
    let total_width = (1usize << max_depth) as f64 * HEAP_SLOT_WIDTH;
    for (i, node) in graph.nodes().iter().enumerate() {
        let depth = heap_depth(i);
        let level_count = 1usize << depth;
        let pos_in_level = i + 1 - level_count;
        let slot_width = total_width / level_count as f64;
        let position = Position {
            x: (pos_in_level as f64 + 0.5) * slot_width,
            y: depth as f64 * LEVEL_HEIGHT + HEAP_MARGIN_Y,
        };
        out.push(&node.id, position, depth);
    }
    out.extent = (
        total_width,
        max_depth as f64 * LEVEL_HEIGHT + 2.0 * HEAP_MARGIN_Y,
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphEdge;
    use crate::graph::GraphNode;
    use crate::graph::Side;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id, id, None)
    }

    fn edge(from: &str, to: &str, side: Side) -> GraphEdge {
        GraphEdge::new(from, to, Some(side))
    }

    /// A seven-node balanced BST listed in breadth-first order, with
    /// the in-order sequence `a b c d e f g`.
    fn balanced_bst() -> StructureGraph {
        StructureGraph::new(
            ["d", "b", "f", "a", "c", "e", "g"]
                .into_iter()
                .map(node)
                .collect(),
            vec![
                edge("d", "b", Side::Left),
                edge("d", "f", Side::Right),
                edge("b", "a", Side::Left),
                edge("b", "c", Side::Right),
                edge("f", "e", Side::Left),
                edge("f", "g", Side::Right),
            ],
        )
    }

    #[test]
    fn empty_graph_has_empty_layout() {
        let graph = StructureGraph::default();
        for mode in [LayoutMode::Bst, LayoutMode::Heap] {
            let out = layout(&graph, mode);
            assert!(out.is_empty());
            assert_eq!(out.extent(), (0.0, 0.0));
        }
    }

    #[test]
    fn bst_in_order_x_is_strictly_increasing() {
        let graph = balanced_bst();
        let out = layout(&graph, LayoutMode::Bst);
        let order: Vec<&str> = out.placements().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d", "e", "f", "g"]);
        for pair in out.placements().windows(2) {
            assert!(pair[0].position.x < pair[1].position.x);
        }
    }

    #[test]
    fn bst_coordinates_follow_slot_and_depth() {
        let graph = balanced_bst();
        let out = layout(&graph, LayoutMode::Bst);
        assert_eq!(
            out.position(&"a".into()),
            Some(Position { x: 60.0, y: 200.0 })
        );
        assert_eq!(
            out.position(&"d".into()),
            Some(Position { x: 360.0, y: 40.0 })
        );
        assert_eq!(out.depth(&"f".into()), Some(1));
        assert_eq!(out.extent(), (720.0, 240.0));
    }

    #[test]
    fn bst_cycle_terminates_and_places_each_node_once() {
        let graph = StructureGraph::new(
            vec![node("r"), node("x")],
            vec![edge("r", "x", Side::Left), edge("x", "r", Side::Right)],
        );
        let out = layout(&graph, LayoutMode::Bst);
        // Every node has an incoming edge; the first node is the root.
        assert_eq!(out.len(), 2);
        assert!(out.position(&"r".into()).is_some());
        assert!(out.position(&"x".into()).is_some());
    }

    #[test]
    fn bst_unreachable_nodes_are_not_placed() {
        let graph = StructureGraph::new(
            vec![node("root"), node("kid"), node("island"), node("islet")],
            vec![
                edge("root", "kid", Side::Right),
                edge("island", "islet", Side::Left),
            ],
        );
        let out = layout(&graph, LayoutMode::Bst);
        assert_eq!(out.len(), 2);
        assert!(out.position(&"island".into()).is_none());
        assert_eq!(out.edges_with_positions(&graph).len(), 1);
    }

    /// Small deterministic generator for tree shapes.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn shuffle<T>(&mut self, items: &mut [T]) {
            for i in (1..items.len()).rev() {
                let j = (self.next() % (i as u64 + 1)) as usize;
                items.swap(i, j);
            }
        }
    }

    fn key_id(key: u32) -> String {
        format!("k{:03}", key)
    }

    /// The tree left by inserting `keys` into an unbalanced BST, with
    /// nodes listed in shuffled order. With `sideless`, every edge whose
    /// slot `binary_children` can infer (a left child, or a right child
    /// after its sibling) carries no side. Returns the graph and each
    /// node's depth.
    fn insertion_tree(
        keys: &[u32],
        sideless: bool,
        rng: &mut Lcg,
    ) -> (StructureGraph, HashMap<String, usize>) {
        let mut left: HashMap<u32, u32> = HashMap::new();
        let mut right: HashMap<u32, u32> = HashMap::new();
        let mut depths = HashMap::new();
        let root = keys[0];
        depths.insert(key_id(root), 0);
        for &key in &keys[1..] {
            let mut at = root;
            let mut depth = 1;
            loop {
                let slot = if key < at { &mut left } else { &mut right };
                match slot.get(&at) {
                    Some(&next) => {
                        at = next;
                        depth += 1;
                    }
                    None => {
                        slot.insert(at, key);
                        break;
                    }
                }
            }
            depths.insert(key_id(key), depth);
        }

        let mut edges = Vec::new();
        for &parent in keys {
            let l = left.get(&parent);
            let r = right.get(&parent);
            if let Some(&l) = l {
                let side = (!sideless).then_some(Side::Left);
                edges.push(GraphEdge::new(key_id(parent), key_id(l), side));
            }
            if let Some(&r) = r {
                let side = if sideless && l.is_some() {
                    None
                } else {
                    Some(Side::Right)
                };
                edges.push(GraphEdge::new(key_id(parent), key_id(r), side));
            }
        }
        // Side-less edges depend on left coming before right.
        if !sideless {
            rng.shuffle(&mut edges);
        }
        let mut nodes: Vec<GraphNode> = keys.iter().map(|&k| node(&key_id(k))).collect();
        rng.shuffle(&mut nodes);
        (StructureGraph::new(nodes, edges), depths)
    }

    #[test]
    fn bst_layout_holds_across_generated_shapes() {
        let mut rng = Lcg(0x5eed);
        let mut shapes: Vec<(String, Vec<u32>)> = vec![
            ("single".into(), vec![5]),
            ("left chain".into(), (0..12).rev().collect()),
            ("right chain".into(), (0..12).collect()),
            ("zigzag".into(), vec![0, 20, 1, 19, 2, 18, 3, 17]),
        ];
        for round in 0..6 {
            let mut keys: Vec<u32> = (0..25).collect();
            rng.shuffle(&mut keys);
            shapes.push((format!("random {}", round), keys));
        }

        for (name, keys) in &shapes {
            for sideless in [false, true] {
                let (graph, depths) = insertion_tree(keys, sideless, &mut rng);
                let out = layout(&graph, LayoutMode::Bst);
                assert_eq!(out.len(), keys.len(), "{} placed every node", name);

                // In-order of a BST is ascending key order.
                let mut sorted = keys.clone();
                sorted.sort();
                let placed: Vec<&str> = out.placements().iter().map(|p| p.id.as_str()).collect();
                let expected: Vec<String> = sorted.iter().map(|&k| key_id(k)).collect();
                assert_eq!(placed, expected, "{} (sideless: {})", name, sideless);

                for pair in out.placements().windows(2) {
                    assert!(
                        pair[0].position.x < pair[1].position.x,
                        "{}: {} then {}",
                        name,
                        pair[0].id,
                        pair[1].id
                    );
                }
                for (slot, placement) in out.placements().iter().enumerate() {
                    let depth = depths[placement.id.as_str()];
                    assert_eq!(placement.depth, depth, "{}: {}", name, placement.id);
                    assert_eq!(
                        placement.position,
                        Position {
                            x: slot as f64 * NODE_SPACING + MARGIN_X,
                            y: depth as f64 * LEVEL_HEIGHT + MARGIN_Y,
                        },
                        "{}: {}",
                        name,
                        placement.id
                    );
                }
            }
        }
    }

    #[test]
    fn heap_depth_matches_log2() {
        let graph = heap_graph_from_sequence((0..20).map(|i| i.to_string()));
        let out = layout(&graph, LayoutMode::Heap);
        for (i, placement) in out.placements().iter().enumerate() {
            let expected = ((i + 1) as f64).log2().floor() as usize;
            assert_eq!(placement.depth, expected, "index {}", i);
            if i > 0 {
                let parent = &out.placements()[(i - 1) / 2];
                assert_eq!(parent.depth + 1, placement.depth);
            }
        }
    }

    #[test]
    fn heap_root_is_centered_and_parents_sit_over_children() {
        let graph = heap_graph_from_sequence((0..15).map(|i| i.to_string()));
        let out = layout(&graph, LayoutMode::Heap);
        let (width, _) = out.extent();
        let root = out.placements()[0].position;
        assert!((root.x - width / 2.0).abs() < 1e-9);
        assert_eq!(root.y, HEAP_MARGIN_Y);
        for i in 0..7 {
            let parent = out.placements()[i].position.x;
            let left = out.placements()[2 * i + 1].position.x;
            let right = out.placements()[2 * i + 2].position.x;
            assert!(left < right);
            assert!((parent - (left + right) / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn heap_levels_have_distinct_ordered_x() {
        let graph = heap_graph_from_sequence((0..11).map(|i| i.to_string()));
        let out = layout(&graph, LayoutMode::Heap);
        let mut by_depth: HashMap<usize, Vec<f64>> = HashMap::new();
        for p in out.placements() {
            by_depth.entry(p.depth).or_default().push(p.position.x);
        }
        for xs in by_depth.values() {
            for pair in xs.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let graph = balanced_bst();
        assert_eq!(
            layout(&graph, LayoutMode::Bst),
            layout(&graph, LayoutMode::Bst)
        );
        assert_eq!(
            layout(&graph, LayoutMode::Heap),
            layout(&graph, LayoutMode::Heap)
        );
    }

    #[test]
    fn edges_pair_with_endpoint_positions() {
        let graph = heap_graph_from_sequence(["a", "b", "c"]);
        let out = layout(&graph, LayoutMode::Heap);
        let edges = out.edges_with_positions(&graph);
        assert_eq!(edges.len(), 2);
        let (e, from, to) = edges[0];
        assert_eq!(e.from.as_str(), "node-0");
        assert!(to.y > from.y);
    }
}
