// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Boolean Kernel
//!
//! Robust triangle-mesh boolean operations (union, intersection, A\B, B\A,
//! symmetric difference) over closed, orientable, consistently-wound
//! surfaces in double precision.

pub mod error;
pub mod geometry;
pub mod op;
pub mod pipeline;
pub mod tolerance;

pub use error::{BooleanError, Result};
pub use geometry::{Mesh, Triangle, Vertex};
pub use op::BooleanOp;
pub use tolerance::{DerivedEpsilons, ToleranceBundle};

/// The crate's single conceptual entry point: evaluate a boolean operation
/// between two closed triangle meshes under a given tolerance bundle.
pub fn run(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp, tolerances: ToleranceBundle) -> Result<Mesh> {
    pipeline::run(mesh_a, mesh_b, op, &tolerances)
}

pub(crate) fn validate_input(mesh: &Mesh, side: &'static str) -> Result<()> {
    if mesh.triangle_count() == 0 {
        return Err(BooleanError::InputEmptyMesh { side });
    }

    for (triangle_idx, triangle) in mesh.triangles.iter().enumerate() {
        let (a, b, c) = mesh.triangle_positions(triangle);
        for (point, label) in [(a, "a"), (b, "b"), (c, "c")] {
            if !point.x.is_finite() || !point.y.is_finite() || !point.z.is_finite() {
                return Err(BooleanError::InputNonFiniteCoordinate {
                    side,
                    triangle: triangle_idx,
                    coordinate: label,
                });
            }
        }
    }

    Ok(())
}
