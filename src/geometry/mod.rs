// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and low-level spatial primitives

mod bbox;
mod bvh;
mod mesh;
mod mesh_utils;
mod predicates;
mod primitives;

pub use bbox::BoundingBox;
pub use bvh::Bvh;
pub use mesh::{Mesh, Triangle, Vertex};
pub use mesh_utils::{build_edge_counts, find_boundary_edges, validate_mesh, Edge, MeshValidation};
pub use predicates::{
    barycentric_coordinates, classify_point_plane, point_in_triangle_barycentric, ray_triangle_intersect,
    triangle_area, triangle_normal, PlaneSide,
};
pub use primitives::{cube, sphere, tetrahedron};
