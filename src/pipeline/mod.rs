// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The boolean evaluation pipeline: intersection finding, graph building,
//! per-mesh topology, face cutting, classification, selection, assembly,
//! and diagnostics, run in that order against a shared tolerance bundle.

pub mod assembler;
pub mod classifier;
pub mod diagnostics;
pub mod face_cutter;
pub mod graph_builder;
pub mod intersection_finder;
pub mod selector;
pub mod spatial_hash;
pub mod topology;

/// Which input mesh a patch or label originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

use crate::error::Result;
use crate::geometry::Mesh;
use crate::op::BooleanOp;
use crate::tolerance::ToleranceBundle;

/// Run the full pipeline end to end: the crate's single conceptual entry
/// point (`run(meshA, meshB, op, tolerances) -> mesh`).
pub fn run(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp, tolerances: &ToleranceBundle) -> Result<Mesh> {
    crate::validate_input(mesh_a, "A")?;
    crate::validate_input(mesh_b, "B")?;

    let reference_edge_length = estimate_reference_edge_length(mesh_a, mesh_b);
    let eps = tolerances.derived(reference_edge_length);

    let finder_output = intersection_finder::find(mesh_a, mesh_b, &eps, tolerances.angle_epsilon_radians)?;
    diagnostics::checkpoint("intersection_finder", &finder_output);

    let graph = graph_builder::build(&finder_output, &eps)?;
    diagnostics::checkpoint("graph_builder", &graph);

    let topology_report = topology::trace_loops(&graph);
    diagnostics::checkpoint("topology", &topology_report);

    let patches = face_cutter::cut(mesh_a, mesh_b, &graph, &eps, tolerances.area_epsilon)?;
    diagnostics::checkpoint("face_cutter", &patches);

    let tagged = classifier::classify(mesh_a, mesh_b, &patches, &eps)?;
    diagnostics::checkpoint("classifier", &tagged);

    let selected = selector::select(&tagged, op)?;
    diagnostics::checkpoint("selector", &selected);

    let assembled = assembler::assemble(&selected, &eps, &graph)?;
    diagnostics::checkpoint_assembled_mesh(&assembled, &graph, &eps);

    Ok(assembled)
}

fn estimate_reference_edge_length(mesh_a: &Mesh, mesh_b: &Mesh) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for mesh in [mesh_a, mesh_b] {
        for triangle in mesh.triangles.iter().take(64) {
            let (a, b, c) = mesh.triangle_positions(triangle);
            sum += (b - a).norm() + (c - b).norm() + (a - c).norm();
            count += 3;
        }
    }

    if count == 0 {
        1.0
    } else {
        (sum / count as f64).max(f64::EPSILON)
    }
}
