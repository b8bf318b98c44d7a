// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 8: textual checkpoint reporting, gated by an environment variable.
//! Diagnostics are pure observers: nothing here feeds back into the
//! pipeline's results.

use crate::geometry::{find_boundary_edges, validate_mesh, Mesh};
use crate::pipeline::classifier::TaggedPatch;
use crate::pipeline::face_cutter::Patch;
use crate::pipeline::graph_builder::IntersectionGraph;
use crate::pipeline::intersection_finder::FinderOutput;
use crate::pipeline::topology::TopologyReport;
use crate::tolerance::DerivedEpsilons;
use nalgebra::Point3;

const DIAGNOSTICS_ENV_VAR: &str = "POLYFRAME_BOOLEAN_DIAGNOSTICS";

fn enabled() -> bool {
    std::env::var(DIAGNOSTICS_ENV_VAR).map(|v| v == "1").unwrap_or(false)
}

/// Something a pipeline stage can report a one-line summary of.
pub trait Checkpoint {
    fn checkpoint_summary(&self) -> String;
}

pub fn checkpoint<T: Checkpoint>(stage: &str, value: &T) {
    if !enabled() {
        return;
    }
    eprintln!("[polyframe-boolean] {stage}: {}", value.checkpoint_summary());
}

impl Checkpoint for FinderOutput {
    fn checkpoint_summary(&self) -> String {
        format!(
            "{} transversal segments, {} coplanar pairs",
            self.segments.len(),
            self.coplanar_pairs.len()
        )
    }
}

impl Checkpoint for IntersectionGraph {
    fn checkpoint_summary(&self) -> String {
        format!(
            "{} merged vertices, {} edges, {} A-triangles with evidence, {} B-triangles with evidence",
            self.vertices.len(),
            self.edges.len(),
            self.evidence_a.len(),
            self.evidence_b.len()
        )
    }
}

impl Checkpoint for TopologyReport {
    fn checkpoint_summary(&self) -> String {
        format!("{} loops traced, {} unresolved edges", self.loops.len(), self.unresolved_edge_count)
    }
}

impl Checkpoint for Vec<Patch> {
    fn checkpoint_summary(&self) -> String {
        format!("{} patches", self.len())
    }
}

impl Checkpoint for Vec<TaggedPatch> {
    fn checkpoint_summary(&self) -> String {
        let inside = self.iter().filter(|t| matches!(t.label, crate::pipeline::classifier::Label::Inside)).count();
        let outside = self.iter().filter(|t| matches!(t.label, crate::pipeline::classifier::Label::Outside)).count();
        let on = self.len() - inside - outside;
        format!("{inside} inside, {outside} outside, {on} on-boundary")
    }
}

impl Checkpoint for Mesh {
    fn checkpoint_summary(&self) -> String {
        let validation = validate_mesh(self);
        if validation.non_manifold_edges.is_empty() {
            format!(
                "{} vertices, {} triangles, manifold",
                self.vertex_count(),
                self.triangle_count()
            )
        } else {
            let sample: Vec<String> = validation
                .non_manifold_edges
                .iter()
                .take(5)
                .map(|(edge, count)| {
                    let p0 = self.vertices[edge.v0].position;
                    let p1 = self.vertices[edge.v1].position;
                    format!("({p0:?})-({p1:?}) used {count} times")
                })
                .collect();
            format!(
                "{} vertices, {} triangles, {} non-manifold edges: {}",
                self.vertex_count(),
                self.triangle_count(),
                validation.non_manifold_edges.len(),
                sample.join("; ")
            )
        }
    }
}

/// Assembler checkpoint plus §4.8's boundary-edge-versus-graph cross-check:
/// every boundary edge left in the assembled mesh should have both endpoints
/// mapped to adjacent vertices on the intersection graph. Assembly itself
/// only surfaces this as a `BoundaryNotAdjacentInGraph` error on a mesh that
/// is already non-manifold; here it is reported even when the mesh is
/// otherwise closed, as an early signal that the Selector kept something it
/// shouldn't have.
pub fn checkpoint_assembled_mesh(mesh: &Mesh, graph: &IntersectionGraph, eps: &DerivedEpsilons) {
    if !enabled() {
        return;
    }
    eprintln!("[polyframe-boolean] assembler: {}", mesh.checkpoint_summary());

    let boundary_edges = find_boundary_edges(mesh);
    if boundary_edges.is_empty() {
        return;
    }

    let mut off_graph = 0usize;
    let mut not_adjacent = 0usize;
    for edge in &boundary_edges {
        let p0 = mesh.vertices[edge.v0].position;
        let p1 = mesh.vertices[edge.v1].position;
        match (
            nearest_graph_vertex(graph, &p0, eps.merge_epsilon),
            nearest_graph_vertex(graph, &p1, eps.merge_epsilon),
        ) {
            (Some(g0), Some(g1)) if graph.are_adjacent(g0, g1) => {}
            (Some(_), Some(_)) => not_adjacent += 1,
            _ => off_graph += 1,
        }
    }

    eprintln!(
        "[polyframe-boolean] assembler: {} boundary edges ({} off the intersection graph, {} on it but not adjacent)",
        boundary_edges.len(),
        off_graph,
        not_adjacent
    );
}

fn nearest_graph_vertex(graph: &IntersectionGraph, point: &Point3<f64>, epsilon: f64) -> Option<u32> {
    graph
        .vertices
        .iter()
        .filter(|v| (v.position - point).norm() <= epsilon)
        .min_by(|a, b| {
            (a.position - point)
                .norm_squared()
                .partial_cmp(&(b.position - point).norm_squared())
                .unwrap()
        })
        .map(|v| v.id)
}
