// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The five supported boolean operations (§3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Intersection,
    DifferenceAB,
    DifferenceBA,
    SymmetricDifference,
}

impl BooleanOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::DifferenceAB => "difference_ab",
            Self::DifferenceBA => "difference_ba",
            Self::SymmetricDifference => "symmetric_difference",
        }
    }
}
