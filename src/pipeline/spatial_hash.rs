// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Voxel-hash coincident-point merging, shared by the Graph Builder (§4.2)
//! and the Assembler (§4.7). Both stages need the same primitive: "does an
//! existing point already sit within epsilon of this one", answered without
//! an O(n^2) scan.

use ahash::AHashMap;
use nalgebra::Point3;

type Cell = (i64, i64, i64);

/// A voxel-hash table mapping merged 3D points to stable integer ids, with
/// epsilon-radius coincidence lookup via a 3x3x3 neighbor search.
pub struct SpatialHash {
    epsilon: f64,
    cell_size: f64,
    cells: AHashMap<Cell, Vec<u32>>,
    points: Vec<Point3<f64>>,
}

impl SpatialHash {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            cell_size: epsilon.max(f64::EPSILON),
            cells: AHashMap::new(),
            points: Vec::new(),
        }
    }

    fn cell_of(&self, p: &Point3<f64>) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    /// Find an existing merged point within `epsilon` of `p`, if any.
    fn find(&self, p: &Point3<f64>) -> Option<u32> {
        let (cx, cy, cz) = self.cell_of(p);
        let eps_sq = self.epsilon * self.epsilon;

        let mut best: Option<(u32, f64)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &id in ids {
                            let candidate = &self.points[id as usize];
                            let dist_sq = (candidate - p).norm_squared();
                            if dist_sq <= eps_sq {
                                if best.map(|(_, best_dist)| dist_sq < best_dist).unwrap_or(true) {
                                    best = Some((id, dist_sq));
                                }
                            }
                        }
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// Merge `p` into an existing id within epsilon, or insert it as a new
    /// one. Returns `(id, created)`.
    pub fn insert(&mut self, p: Point3<f64>) -> (u32, bool) {
        if let Some(id) = self.find(&p) {
            return (id, false);
        }

        let id = self.points.len() as u32;
        self.points.push(p);
        let cell = self.cell_of(&p);
        self.cells.entry(cell).or_default().push(id);
        (id, true)
    }

    pub fn point(&self, id: u32) -> &Point3<f64> {
        &self.points[id as usize]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_merge_to_one_id() {
        let mut hash = SpatialHash::new(1e-6);
        let (id_a, created_a) = hash.insert(Point3::new(0.0, 0.0, 0.0));
        let (id_b, created_b) = hash.insert(Point3::new(1e-9, 0.0, 0.0));
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn distant_points_get_distinct_ids() {
        let mut hash = SpatialHash::new(1e-6);
        let (id_a, _) = hash.insert(Point3::new(0.0, 0.0, 0.0));
        let (id_b, _) = hash.insert(Point3::new(1.0, 0.0, 0.0));
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn neighbor_search_crosses_cell_boundaries() {
        let mut hash = SpatialHash::new(0.01);
        let (id_a, _) = hash.insert(Point3::new(0.0049, 0.0, 0.0));
        let (id_b, _) = hash.insert(Point3::new(0.0051, 0.0, 0.0));
        assert_eq!(id_a, id_b);
    }
}
