// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed-mesh fixture generators, used by tests and scenario benchmarks.
//! Not part of the boolean kernel's public contract.

use super::{Mesh, Triangle, Vertex};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// A tetrahedron with the given corners, wound outward. `a, b, c` form the
/// base (CCW when viewed from outside `d`'s side is not assumed — winding
/// is derived from the corner order so callers matching spec scenarios S1/S2
/// get consistent orientation).
pub fn tetrahedron(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, d: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::new();
    let faces = [[a, c, b], [a, b, d], [b, c, d], [c, a, d]];

    for face in faces {
        let normal = super::predicates::triangle_normal(&face[0], &face[1], &face[2])
            .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
        let i0 = mesh.add_vertex(Vertex::new(face[0], normal));
        let i1 = mesh.add_vertex(Vertex::new(face[1], normal));
        let i2 = mesh.add_vertex(Vertex::new(face[2], normal));
        mesh.add_triangle(Triangle::new([i0, i1, i2]));
    }

    mesh
}

/// Axis-aligned cube, either corner-anchored at the origin or centered.
pub fn cube(size: Vector3<f64>, center: bool) -> Mesh {
    let mut mesh = Mesh::new();

    let (min_x, max_x) = if center { (-size.x / 2.0, size.x / 2.0) } else { (0.0, size.x) };
    let (min_y, max_y) = if center { (-size.y / 2.0, size.y / 2.0) } else { (0.0, size.y) };
    let (min_z, max_z) = if center { (-size.z / 2.0, size.z / 2.0) } else { (0.0, size.z) };

    let positions = [
        Point3::new(min_x, min_y, min_z),
        Point3::new(max_x, min_y, min_z),
        Point3::new(max_x, max_y, min_z),
        Point3::new(min_x, max_y, min_z),
        Point3::new(min_x, min_y, max_z),
        Point3::new(max_x, min_y, max_z),
        Point3::new(max_x, max_y, max_z),
        Point3::new(min_x, max_y, max_z),
    ];

    let faces = [
        ([4, 5, 6], Vector3::new(0.0, 0.0, 1.0)),
        ([4, 6, 7], Vector3::new(0.0, 0.0, 1.0)),
        ([1, 0, 3], Vector3::new(0.0, 0.0, -1.0)),
        ([1, 3, 2], Vector3::new(0.0, 0.0, -1.0)),
        ([5, 1, 2], Vector3::new(1.0, 0.0, 0.0)),
        ([5, 2, 6], Vector3::new(1.0, 0.0, 0.0)),
        ([0, 4, 7], Vector3::new(-1.0, 0.0, 0.0)),
        ([0, 7, 3], Vector3::new(-1.0, 0.0, 0.0)),
        ([7, 6, 2], Vector3::new(0.0, 1.0, 0.0)),
        ([7, 2, 3], Vector3::new(0.0, 1.0, 0.0)),
        ([0, 1, 5], Vector3::new(0.0, -1.0, 0.0)),
        ([0, 5, 4], Vector3::new(0.0, -1.0, 0.0)),
    ];

    for (indices, normal) in faces {
        let v0 = mesh.add_vertex(Vertex::new(positions[indices[0]], normal));
        let v1 = mesh.add_vertex(Vertex::new(positions[indices[1]], normal));
        let v2 = mesh.add_vertex(Vertex::new(positions[indices[2]], normal));
        mesh.add_triangle(Triangle::new([v0, v1, v2]));
    }

    mesh
}

/// UV-sphere centered at `center` with the given radius and latitude/longitude
/// segment count, welded so it is a genuinely closed manifold (unlike a
/// per-face-vertex cube, it shares vertices across triangles by construction).
pub fn sphere(center: Point3<f64>, radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments.max(3);
    let slices = segments.max(3);

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            let x = r * theta.cos();
            let z = r * theta.sin();

            let local = Vector3::new(x, y, z);
            let position = center + local;
            let normal = local.normalize();
            mesh.add_vertex(Vertex::new(position, normal));
        }
    }

    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            mesh.add_triangle(Triangle::new([first as usize, second as usize, (first + 1) as usize]));
            mesh.add_triangle(Triangle::new([
                second as usize,
                (second + 1) as usize,
                (first + 1) as usize,
            ]));
        }
    }

    mesh
}
