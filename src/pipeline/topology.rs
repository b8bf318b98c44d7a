// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 3: trace the intersection graph's edges into closed loops. Purely
//! informational (§4.3) — the Face Cutter only needs per-triangle evidence,
//! not loop structure — but every edge should end up in exactly one loop,
//! which is checked and reported through diagnostics rather than failing
//! the run.

use crate::pipeline::graph_builder::IntersectionGraph;
use ahash::AHashMap;

/// A simple closed loop of global vertex ids, first == last implied (not
/// repeated in the stored vector).
pub type Loop = Vec<u32>;

pub struct TopologyReport {
    pub loops: Vec<Loop>,
    /// Edges that could not be folded into a closed loop (dangling ends,
    /// branch points with degree != 2). Empty on a well-formed graph.
    pub unresolved_edge_count: usize,
}

pub fn trace_loops(graph: &IntersectionGraph) -> TopologyReport {
    let mut adjacency: AHashMap<u32, Vec<(u32, usize)>> = AHashMap::new();
    for (idx, edge) in graph.edges.iter().enumerate() {
        adjacency.entry(edge.v0).or_default().push((edge.v1, idx));
        adjacency.entry(edge.v1).or_default().push((edge.v0, idx));
    }

    let mut used = vec![false; graph.edges.len()];
    let mut loops = Vec::new();

    for start_idx in 0..graph.edges.len() {
        if used[start_idx] {
            continue;
        }

        let edge = &graph.edges[start_idx];
        let start_vertex = edge.v0;
        let mut current_vertex = edge.v1;
        used[start_idx] = true;
        let mut path = vec![start_vertex, current_vertex];

        loop {
            if current_vertex == start_vertex {
                break;
            }
            let next = adjacency
                .get(&current_vertex)
                .into_iter()
                .flatten()
                .find(|(_, edge_idx)| !used[*edge_idx]);

            match next {
                Some(&(neighbor, edge_idx)) => {
                    used[edge_idx] = true;
                    current_vertex = neighbor;
                    if current_vertex != start_vertex {
                        path.push(current_vertex);
                    }
                }
                None => break,
            }
        }

        loops.push(path);
    }

    let unresolved_edge_count = used.iter().filter(|&&u| !u).count();
    TopologyReport { loops, unresolved_edge_count }
}
