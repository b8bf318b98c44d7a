// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use super::BoundingBox;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    pub fn is_degenerate(&self) -> bool {
        self.indices[0] == self.indices[1]
            || self.indices[1] == self.indices[2]
            || self.indices[2] == self.indices[0]
    }
}

/// Triangular mesh: a flat vertex buffer plus index triples.
///
/// This is the shared currency between every pipeline stage and the public
/// `run` entry point. Nothing about boolean-operation semantics lives here;
/// this type only knows how to hold and lightly massage geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle_positions(&self, triangle: &Triangle) -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            self.vertices[triangle.indices[0]].position,
            self.vertices[triangle.indices[1]].position,
            self.vertices[triangle.indices[2]].position,
        )
    }

    /// Weld vertices that are within epsilon distance of each other.
    /// Returns the number of vertices removed. Quadratic; intended for
    /// small fixture meshes in tests, not for the Assembler's weld pass
    /// (which uses the voxel-hash table in `pipeline::spatial_hash`).
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Vertex> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for i in 0..original_count {
            let pos_i = self.vertices[i].position;
            let mut found_match = false;

            for (j, welded) in new_vertices.iter().enumerate() {
                if (pos_i - welded.position).norm() < epsilon {
                    new_indices[i] = j;
                    found_match = true;
                    break;
                }
            }

            if !found_match {
                new_indices[i] = new_vertices.len();
                new_vertices.push(self.vertices[i]);
            }
        }

        for triangle in &mut self.triangles {
            triangle.indices[0] = new_indices[triangle.indices[0]];
            triangle.indices[1] = new_indices[triangle.indices[1]];
            triangle.indices[2] = new_indices[triangle.indices[2]];
        }

        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }

    /// Remove exact-duplicate triangles (same indices, same winding) and
    /// degenerate triangles. Returns the number removed.
    pub fn remove_duplicate_triangles(&mut self) -> usize {
        use std::collections::HashSet;

        let original_count = self.triangles.len();
        let mut seen: HashSet<(usize, usize, usize)> = HashSet::new();
        let mut new_triangles: Vec<Triangle> = Vec::new();

        for triangle in &self.triangles {
            if triangle.is_degenerate() {
                continue;
            }
            let i0 = triangle.indices[0];
            let i1 = triangle.indices[1];
            let i2 = triangle.indices[2];
            if i0 >= self.vertices.len() || i1 >= self.vertices.len() || i2 >= self.vertices.len() {
                continue;
            }

            let key = (i0, i1, i2);
            if seen.insert(key) {
                new_triangles.push(*triangle);
            }
        }

        let removed = original_count - new_triangles.len();
        self.triangles = new_triangles;
        removed
    }

    /// Remove vertices not referenced by any triangle. Returns the number removed.
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        if self.triangles.is_empty() {
            let removed = self.vertices.len();
            self.vertices.clear();
            return removed;
        }

        let mut used_vertices = vec![false; self.vertices.len()];
        for triangle in &self.triangles {
            used_vertices[triangle.indices[0]] = true;
            used_vertices[triangle.indices[1]] = true;
            used_vertices[triangle.indices[2]] = true;
        }

        let mut new_indices = vec![0; self.vertices.len()];
        let mut new_vertices = Vec::new();
        let mut new_index = 0;

        for (old_idx, &used) in used_vertices.iter().enumerate() {
            if used {
                new_indices[old_idx] = new_index;
                new_vertices.push(self.vertices[old_idx]);
                new_index += 1;
            }
        }

        for triangle in &mut self.triangles {
            triangle.indices[0] = new_indices[triangle.indices[0]];
            triangle.indices[1] = new_indices[triangle.indices[1]];
            triangle.indices[2] = new_indices[triangle.indices[2]];
        }

        let removed = self.vertices.len() - new_vertices.len();
        self.vertices = new_vertices;
        removed
    }

    /// Recompute vertex normals from triangle geometry, area-weighted.
    pub fn recompute_normals(&mut self) {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            return;
        }

        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];
        let mut normal_counts: Vec<u32> = vec![0; self.vertices.len()];

        for triangle in &self.triangles {
            let v0 = &self.vertices[triangle.indices[0]];
            let v1 = &self.vertices[triangle.indices[1]];
            let v2 = &self.vertices[triangle.indices[2]];

            let edge1 = v1.position - v0.position;
            let edge2 = v2.position - v0.position;
            let face_normal = edge1.cross(&edge2);

            let area = face_normal.norm();
            if area > 1e-10 {
                let normalized_face_normal = face_normal / area;
                for &idx in &triangle.indices {
                    normal_sums[idx] += normalized_face_normal * area;
                    normal_counts[idx] += 1;
                }
            }
        }

        for (i, vertex) in self.vertices.iter_mut().enumerate() {
            if normal_counts[i] > 0 && normal_sums[i].norm() > 1e-12 {
                vertex.normal = normal_sums[i].normalize();
            } else {
                vertex.normal = Vector3::new(0.0, 0.0, 1.0);
            }
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
