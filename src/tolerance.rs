// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The tolerance bundle: the kernel's only configuration surface.
//! Every near-equality decision anywhere in the pipeline derives from one
//! of these values — no stage is permitted to fold its own epsilon constant
//! into a code path (§9 "Numerical robustness").

use crate::error::{BooleanError, Result};
use serde::{Deserialize, Serialize};

/// User-supplied tolerances, per §6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBundle {
    pub distance_epsilon: f64,
    pub angle_epsilon_radians: f64,
    pub area_epsilon: f64,
}

impl ToleranceBundle {
    pub fn new(distance_epsilon: f64, angle_epsilon_radians: f64, area_epsilon: f64) -> Result<Self> {
        let bundle = Self {
            distance_epsilon,
            angle_epsilon_radians,
            area_epsilon,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("distanceEpsilon", self.distance_epsilon),
            ("angleEpsilonRadians", self.angle_epsilon_radians),
            ("areaEpsilon", self.area_epsilon),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(BooleanError::InvalidTolerance {
                    field: name,
                    value,
                });
            }
        }
        Ok(())
    }

    /// The values used by the S1-S6 reference scenarios in §8.
    pub fn reference() -> Self {
        Self {
            distance_epsilon: 1e-9,
            angle_epsilon_radians: 1e-9,
            area_epsilon: 1e-12,
        }
    }

    /// Derive the dependent epsilons per §6's documented rule.
    pub fn derived(&self, reference_edge_length: f64) -> DerivedEpsilons {
        let plane_side_epsilon = self.distance_epsilon;
        let merge_epsilon = self.distance_epsilon;

        let raw_barycentric = if reference_edge_length.abs() > f64::EPSILON {
            self.distance_epsilon / reference_edge_length
        } else {
            self.distance_epsilon
        };
        let barycentric_epsilon = raw_barycentric.clamp(1e-12, 1e-3);

        DerivedEpsilons {
            plane_side_epsilon,
            barycentric_epsilon,
            merge_epsilon,
        }
    }
}

impl Default for ToleranceBundle {
    fn default() -> Self {
        Self::reference()
    }
}

/// Epsilons computed from a [`ToleranceBundle`] by the rule in §6, never
/// recomputed ad hoc inside a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedEpsilons {
    pub plane_side_epsilon: f64,
    pub barycentric_epsilon: f64,
    pub merge_epsilon: f64,
}
