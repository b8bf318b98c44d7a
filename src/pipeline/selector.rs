// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 6: pick patches per operation from both tagged sets, flipping
//! winding on B-patches whose contribution inverts the surface they came
//! from (§4.6's table).

use crate::error::Result;
use crate::op::BooleanOp;
use crate::pipeline::classifier::{Label, TaggedPatch};
use crate::pipeline::face_cutter::Patch;
use crate::pipeline::Side;

/// `None` drops the patch; `Some(reverse)` keeps it, reversing winding when
/// `reverse` is true.
fn rule(op: BooleanOp, side: Side, label: Label) -> Option<bool> {
    use BooleanOp::*;
    use Label::*;
    use Side::*;

    match (op, side, label) {
        (Union, A, Outside) => Some(false),
        (Union, B, Outside) => Some(false),
        (Union, _, _) => None,

        (Intersection, A, Inside) => Some(false),
        (Intersection, B, Inside) => Some(false),
        (Intersection, _, _) => None,

        (DifferenceAB, A, Outside) => Some(false),
        (DifferenceAB, B, Inside) => Some(true),
        (DifferenceAB, _, _) => None,

        (DifferenceBA, B, Outside) => Some(false),
        (DifferenceBA, A, Inside) => Some(true),
        (DifferenceBA, _, _) => None,

        (SymmetricDifference, A, Outside) => Some(false),
        (SymmetricDifference, B, Outside) => Some(false),
        (SymmetricDifference, B, Inside) => Some(true),
        (SymmetricDifference, A, Inside) => None,
        (SymmetricDifference, _, On) => None,

        #[allow(unreachable_patterns)]
        _ => None,
    }
}

pub fn select(tagged: &[TaggedPatch], op: BooleanOp) -> Result<Vec<Patch>> {
    let mut selected = Vec::new();

    for entry in tagged {
        match rule(op, entry.patch.side, entry.label) {
            Some(reverse) => {
                let mut patch = entry.patch;
                if reverse {
                    patch.vertices.swap(1, 2);
                }
                selected.push(patch);
            }
            None => {}
        }
    }

    Ok(selected)
}
