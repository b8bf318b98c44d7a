// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities: edge-use histograms and manifoldness checks.
//! Used by the Assembler (§4.7) and Diagnostics (§4.8).

use super::Mesh;
use std::collections::{HashMap, HashSet};

/// Undirected edge, canonicalized so `v0 <= v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub v0: usize,
    pub v1: usize,
}

impl Edge {
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

fn triangle_edges(indices: [usize; 3]) -> [Edge; 3] {
    [
        Edge::new(indices[0], indices[1]),
        Edge::new(indices[1], indices[2]),
        Edge::new(indices[2], indices[0]),
    ]
}

/// Build the edge-use histogram: for every undirected edge in the mesh, how
/// many triangles use it.
pub fn build_edge_counts(mesh: &Mesh) -> HashMap<Edge, u32> {
    let mut edge_counts: HashMap<Edge, u32> = HashMap::new();
    for triangle in &mesh.triangles {
        for edge in triangle_edges(triangle.indices) {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }
    edge_counts
}

/// Edges used by exactly one triangle.
pub fn find_boundary_edges(mesh: &Mesh) -> HashSet<Edge> {
    build_edge_counts(mesh)
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(edge, _)| edge)
        .collect()
}

/// Summary of a mesh's manifoldness, per §4.7/§8's universal invariant 1.
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    pub non_manifold_edges: Vec<(Edge, u32)>,
}

pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let edge_counts = build_edge_counts(mesh);

    let non_manifold_edges: Vec<(Edge, u32)> = edge_counts
        .iter()
        .filter(|(_, &count)| count != 2)
        .map(|(edge, &count)| (*edge, count))
        .collect();

    let boundary_edge_count = edge_counts.values().filter(|&&count| count == 1).count();

    MeshValidation {
        is_manifold: non_manifold_edges.iter().all(|(_, count)| *count <= 2),
        is_closed: non_manifold_edges.is_empty(),
        edge_count: edge_counts.len(),
        boundary_edge_count,
        non_manifold_edges,
    }
}
