// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 7: weld selected patches into one indexed mesh and verify strict
//! manifoldness before handing the result back to the caller.

use crate::error::{BooleanError, Result};
use crate::geometry::{validate_mesh, Mesh, Triangle, Vertex};
use crate::pipeline::face_cutter::Patch;
use crate::pipeline::graph_builder::IntersectionGraph;
use crate::pipeline::spatial_hash::SpatialHash;
use crate::tolerance::DerivedEpsilons;
use nalgebra::Vector3;
use std::collections::HashSet;

pub fn assemble(patches: &[Patch], eps: &DerivedEpsilons, graph: &IntersectionGraph) -> Result<Mesh> {
    let mut hash = SpatialHash::new(eps.merge_epsilon);
    let mut triangles: Vec<[u32; 3]> = Vec::with_capacity(patches.len());

    for patch in patches {
        let i0 = hash.insert(patch.vertices[0]).0;
        let i1 = hash.insert(patch.vertices[1]).0;
        let i2 = hash.insert(patch.vertices[2]).0;

        if i0 == i1 || i1 == i2 || i2 == i0 {
            continue;
        }
        triangles.push([i0, i1, i2]);
    }

    let mut seen: HashSet<(u32, u32, u32)> = HashSet::new();
    triangles.retain(|t| {
        let mut sorted = *t;
        sorted.sort_unstable();
        seen.insert((sorted[0], sorted[1], sorted[2]))
    });

    let mut mesh = Mesh::with_capacity(hash.len(), triangles.len());
    for point in hash.points() {
        mesh.add_vertex(Vertex::new(*point, Vector3::new(0.0, 0.0, 1.0)));
    }
    for t in &triangles {
        mesh.add_triangle(Triangle::new([t[0] as usize, t[1] as usize, t[2] as usize]));
    }
    mesh.recompute_normals();

    // Every edge must be used by exactly two triangles for the output to
    // bound a closed solid. Boundary edges (used once) get a more specific
    // diagnosis first: if their endpoints sit on the intersection graph but
    // aren't adjacent there, that pinpoints the bug rather than reporting a
    // generic non-manifold edge.
    let validation = validate_mesh(&mesh);
    if !validation.non_manifold_edges.is_empty() {
        check_boundary_adjacency(&mesh, &validation, graph, eps)?;

        let (edge, count) = validation.non_manifold_edges[0];
        return Err(BooleanError::NonManifoldEdge {
            edge: (edge.v0 as u32, edge.v1 as u32),
            use_count: count,
        });
    }

    Ok(mesh)
}

fn check_boundary_adjacency(
    mesh: &Mesh,
    validation: &crate::geometry::MeshValidation,
    graph: &IntersectionGraph,
    eps: &DerivedEpsilons,
) -> Result<()> {
    if validation.boundary_edge_count == 0 {
        return Ok(());
    }

    let mut graph_hash = SpatialHash::new(eps.merge_epsilon);
    for vertex in &graph.vertices {
        graph_hash.insert(vertex.position);
    }
    let mut position_to_graph_id: Vec<Option<u32>> = vec![None; graph_hash.len()];
    for (i, p) in graph_hash.points().iter().enumerate() {
        let nearest = graph
            .vertices
            .iter()
            .min_by(|a, b| (a.position - p).norm_squared().partial_cmp(&(b.position - p).norm_squared()).unwrap());
        position_to_graph_id[i] = nearest.map(|v| v.id);
    }

    for (edge, count) in &validation.non_manifold_edges {
        if *count != 1 {
            continue;
        }
        let p0 = mesh.vertices[edge.v0].position;
        let p1 = mesh.vertices[edge.v1].position;

        let gid0 = lookup_graph_vertex(&graph_hash, &position_to_graph_id, &p0, eps.merge_epsilon);
        let gid1 = lookup_graph_vertex(&graph_hash, &position_to_graph_id, &p1, eps.merge_epsilon);

        if let (Some(g0), Some(g1)) = (gid0, gid1) {
            if !graph.are_adjacent(g0, g1) {
                return Err(BooleanError::BoundaryNotAdjacentInGraph { v0: g0, v1: g1 });
            }
        }
    }

    Ok(())
}

fn lookup_graph_vertex(
    hash: &SpatialHash,
    mapping: &[Option<u32>],
    point: &nalgebra::Point3<f64>,
    merge_epsilon: f64,
) -> Option<u32> {
    hash.points()
        .iter()
        .position(|p| (p - point).norm() < merge_epsilon)
        .and_then(|idx| mapping[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tetrahedron;
    use crate::tolerance::ToleranceBundle;
    use ahash::AHashMap;
    use nalgebra::Point3;

    fn empty_graph() -> IntersectionGraph {
        IntersectionGraph {
            vertices: vec![],
            edges: vec![],
            evidence_a: AHashMap::new(),
            evidence_b: AHashMap::new(),
        }
    }

    #[test]
    fn assembling_a_closed_tetrahedron_is_manifold() {
        let mesh = tetrahedron(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        );
        let patches: Vec<Patch> = mesh
            .triangles
            .iter()
            .map(|t| {
                let (a, b, c) = mesh.triangle_positions(t);
                Patch { vertices: [a, b, c], source_triangle: 0, side: crate::pipeline::Side::A }
            })
            .collect();

        let eps = ToleranceBundle::reference().derived(1.0);
        let graph = empty_graph();
        let assembled = assemble(&patches, &eps, &graph).unwrap();
        assert_eq!(assembled.triangle_count(), 4);
    }

    #[test]
    fn an_open_patch_fails_manifold_validation() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let patches = vec![Patch { vertices: [a, b, c], source_triangle: 0, side: crate::pipeline::Side::A }];

        let eps = ToleranceBundle::reference().derived(1.0);
        let graph = empty_graph();
        assert!(assemble(&patches, &eps, &graph).is_err());
    }
}
