// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The kernel's closed error contract. Every fallible path in the crate
//! returns one of these variants; none of them wrap an opaque `anyhow`-style
//! payload, so a caller can match on `code()` without string-parsing a
//! message (§7).

use thiserror::Error;

/// A stable, machine-matchable identifier for each error variant, per §7's
/// taxonomy (`BP01`..`BP08` prefixes mirror the pipeline stage that raises
/// them).
#[derive(Debug, Error)]
pub enum BooleanError {
    #[error("mesh '{side}' has no triangles")]
    InputEmptyMesh { side: &'static str },

    #[error("mesh '{side}' triangle {triangle} has a non-finite coordinate ({coordinate})")]
    InputNonFiniteCoordinate {
        side: &'static str,
        triangle: usize,
        coordinate: &'static str,
    },

    #[error("tolerance field '{field}' must be finite and positive, got {value}")]
    InvalidTolerance { field: &'static str, value: f64 },

    #[error("triangles {triangle_a} and {triangle_b} overlap in a shared plane, which is unsupported")]
    CoplanarOverlapUnsupported { triangle_a: usize, triangle_b: usize },

    #[error("intersection edge {edge:?} was recorded more than once in the intersection graph")]
    DuplicateGraphEdge { edge: (u32, u32) },

    #[error("triangle {triangle} failed area conservation after cutting: expected {expected}, got {actual}")]
    AreaConservationViolated {
        triangle: usize,
        expected: f64,
        actual: f64,
    },

    #[error("edge {edge:?} is used by {use_count} triangles after assembly, expected exactly 2")]
    NonManifoldEdge { edge: (u32, u32), use_count: u32 },

    #[error("boundary vertices {v0} and {v1} in the intersection graph are not adjacent on either input mesh")]
    BoundaryNotAdjacentInGraph { v0: u32, v1: u32 },

    #[error("classifier could not resolve containment for face {face} after perturbation")]
    ClassificationAmbiguous { face: usize },

    #[error("selector has no rule for operation {operation:?}, side {side}, label {label}")]
    SelectorRuleMissing {
        operation: crate::op::BooleanOp,
        side: &'static str,
        label: &'static str,
    },
}

impl BooleanError {
    /// Stable code string for programmatic matching, independent of the
    /// human-readable `Display` text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputEmptyMesh { .. } => "BP00.INPUT.EMPTY_MESH",
            Self::InputNonFiniteCoordinate { .. } => "BP00.INPUT.NON_FINITE_COORDINATE",
            Self::InvalidTolerance { .. } => "BP00.INPUT.INVALID_TOLERANCE",
            Self::CoplanarOverlapUnsupported { .. } => "BP04.INTERSECTION.COPLANAR_UNSUPPORTED",
            Self::DuplicateGraphEdge { .. } => "BP02.GRAPH.DUPLICATE_EDGE",
            Self::AreaConservationViolated { .. } => "BP04.CUTTER.AREA_CONSERVATION_VIOLATED",
            Self::NonManifoldEdge { .. } => "BP07.ASSEMBLY.NON_MANIFOLD_EDGE",
            Self::BoundaryNotAdjacentInGraph { .. } => "BP07.ASSEMBLY.BOUNDARY_NOT_ADJACENT",
            Self::ClassificationAmbiguous { .. } => "BP05.CLASSIFIER.AMBIGUOUS",
            Self::SelectorRuleMissing { .. } => "BP06.SELECTOR.RULE_MISSING",
        }
    }
}

pub type Result<T> = std::result::Result<T, BooleanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_strings() {
        let err = BooleanError::InputEmptyMesh { side: "A" };
        assert_eq!(err.code(), "BP00.INPUT.EMPTY_MESH");
    }
}
