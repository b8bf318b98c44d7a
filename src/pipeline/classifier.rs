// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 5: tag each patch by containment against the opposite input
//! surface, via ray-cast parity with an on-surface snap test and a
//! perturbation rule for coincident faces.

use crate::error::Result;
use crate::geometry::{
    point_in_triangle_barycentric, ray_triangle_intersect, triangle_normal, BoundingBox, Bvh, Mesh,
};
use crate::pipeline::face_cutter::Patch;
use crate::pipeline::Side;
use crate::tolerance::DerivedEpsilons;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::f64::consts::{E, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Inside,
    Outside,
    On,
}

#[derive(Clone, Copy)]
pub struct TaggedPatch {
    pub patch: Patch,
    pub label: Label,
}

struct OppositeMesh<'a> {
    mesh: &'a Mesh,
    bvh: Bvh,
    max_distance: f64,
}

impl<'a> OppositeMesh<'a> {
    fn build(mesh: &'a Mesh) -> Self {
        let items = mesh
            .triangles
            .iter()
            .enumerate()
            .map(|(idx, tri)| {
                let (a, b, c) = mesh.triangle_positions(tri);
                (idx, BoundingBox::from_triangle(&a, &b, &c))
            })
            .collect();
        let bbox = mesh.bounding_box();
        let max_distance = (bbox.max - bbox.min).norm().max(1.0) * 4.0;
        Self { mesh, bvh: Bvh::build(items), max_distance }
    }
}

pub fn classify(mesh_a: &Mesh, mesh_b: &Mesh, patches: &[Patch], eps: &DerivedEpsilons) -> Result<Vec<TaggedPatch>> {
    let opposite_a = OppositeMesh::build(mesh_a);
    let opposite_b = OppositeMesh::build(mesh_b);

    let tagged: Vec<TaggedPatch> = patches
        .par_iter()
        .map(|patch| {
            let opposite = match patch.side {
                Side::A => &opposite_b,
                Side::B => &opposite_a,
            };
            let label = classify_patch(patch, opposite, eps);
            TaggedPatch { patch: *patch, label }
        })
        .collect();

    Ok(tagged)
}

fn ray_direction() -> Vector3<f64> {
    Vector3::new(1.0, PI / 10.0, E / 10.0).normalize()
}

fn centroid(patch: &Patch) -> Point3<f64> {
    let [a, b, c] = patch.vertices;
    Point3::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0, (a.z + b.z + c.z) / 3.0)
}

fn classify_patch(patch: &Patch, opposite: &OppositeMesh, eps: &DerivedEpsilons) -> Label {
    let point = centroid(patch);

    if on_surface(&point, opposite, eps) {
        let normal = triangle_normal(&patch.vertices[0], &patch.vertices[1], &patch.vertices[2])
            .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
        let offset = eps.merge_epsilon.max(1e-9) * 4.0;

        let plus = point + normal * offset;
        let minus = point - normal * offset;

        let inside_side = ray_parity(&plus, opposite, eps);
        let outside_side = ray_parity(&minus, opposite, eps);

        return match (inside_side, outside_side) {
            (Label::Inside, Label::Outside) => Label::Inside,
            (Label::Outside, Label::Inside) => Label::On,
            _ => ray_parity(&point, opposite, eps),
        };
    }

    ray_parity(&point, opposite, eps)
}

fn ray_parity(origin: &Point3<f64>, opposite: &OppositeMesh, eps: &DerivedEpsilons) -> Label {
    let dir = ray_direction();
    let candidates = opposite.bvh.query_ray(origin, &dir, opposite.max_distance, eps.merge_epsilon.max(1e-6));

    let determinant_epsilon = eps.plane_side_epsilon.max(1e-12);
    let t_min = eps.merge_epsilon.max(1e-9);

    let mut hits = 0usize;
    for idx in candidates {
        let triangle = &opposite.mesh.triangles[idx];
        let (a, b, c) = opposite.mesh.triangle_positions(triangle);
        if ray_triangle_intersect(origin, &dir, &a, &b, &c, determinant_epsilon, t_min).is_some() {
            hits += 1;
        }
    }

    if hits % 2 == 1 {
        Label::Inside
    } else {
        Label::Outside
    }
}

fn on_surface(point: &Point3<f64>, opposite: &OppositeMesh, eps: &DerivedEpsilons) -> bool {
    let radius = eps.plane_side_epsilon.max(1e-9) * 8.0;
    let query = BoundingBox::new(
        Point3::new(point.x - radius, point.y - radius, point.z - radius),
        Point3::new(point.x + radius, point.y + radius, point.z + radius),
    );
    let candidates = opposite.bvh.query(&query);

    for idx in candidates {
        let triangle = &opposite.mesh.triangles[idx];
        let (a, b, c) = opposite.mesh.triangle_positions(triangle);
        let normal = match triangle_normal(&a, &b, &c) {
            Some(n) => n,
            None => continue,
        };
        let distance = normal.dot(&(point - a)).abs();
        if distance > eps.plane_side_epsilon.max(1e-9) {
            continue;
        }
        if point_in_triangle_barycentric(point, &a, &b, &c, eps.barycentric_epsilon) {
            return true;
        }
    }
    false
}
