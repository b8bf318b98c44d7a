// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 1: discover every triangle-pair intersection between mesh A and
//! mesh B. Broad phase is a bounding-volume tree over B queried by each
//! triangle of A; narrow phase is the classic Moller plane-interval test,
//! adapted to emit barycentric-tagged points on both originating triangles.

use crate::error::{BooleanError, Result};
use crate::geometry::{
    barycentric_coordinates, classify_point_plane, triangle_area, triangle_normal, BoundingBox, Bvh, Mesh, PlaneSide,
};
use crate::tolerance::DerivedEpsilons;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// One intersection point, carrying its barycentric position on whichever
/// triangle(s) generated it.
#[derive(Debug, Clone, Copy)]
pub struct RawPoint {
    pub position: Point3<f64>,
    pub bary_a: (f64, f64, f64),
    pub bary_b: (f64, f64, f64),
}

/// The segment contributed by one (A-triangle, B-triangle) transversal pair.
#[derive(Debug, Clone)]
pub struct RawSegment {
    pub a_triangle: usize,
    pub b_triangle: usize,
    pub start: RawPoint,
    pub end: RawPoint,
}

pub struct FinderOutput {
    pub segments: Vec<RawSegment>,
    /// Pairs recorded as lying in a shared plane, for the Classifier's
    /// on-boundary steering; not cutting evidence.
    pub coplanar_pairs: Vec<(usize, usize)>,
}

pub fn find(mesh_a: &Mesh, mesh_b: &Mesh, eps: &DerivedEpsilons, angle_epsilon: f64) -> Result<FinderOutput> {
    let b_items: Vec<(usize, BoundingBox)> = mesh_b
        .triangles
        .iter()
        .enumerate()
        .map(|(idx, tri)| {
            let (a, b, c) = mesh_b.triangle_positions(tri);
            (idx, BoundingBox::from_triangle(&a, &b, &c))
        })
        .collect();
    let bvh_b = Bvh::build(b_items);

    let per_a: Vec<Result<(Vec<RawSegment>, Vec<(usize, usize)>)>> = mesh_a
        .triangles
        .par_iter()
        .enumerate()
        .map(|(a_idx, a_tri)| {
            let (a0, a1, a2) = mesh_a.triangle_positions(a_tri);
            let bbox_a = BoundingBox::from_triangle(&a0, &a1, &a2);
            let candidates = bvh_b.query(&bbox_a);

            let mut segments = Vec::new();
            let mut coplanar = Vec::new();

            for b_idx in candidates {
                let b_tri = &mesh_b.triangles[b_idx];
                let (b0, b1, b2) = mesh_b.triangle_positions(b_tri);

                match classify_pair(a_idx, &a0, &a1, &a2, b_idx, &b0, &b1, &b2, eps, angle_epsilon)? {
                    PairResult::None => {}
                    PairResult::Coplanar => coplanar.push((a_idx, b_idx)),
                    PairResult::Segment(start, end) => segments.push(RawSegment {
                        a_triangle: a_idx,
                        b_triangle: b_idx,
                        start,
                        end,
                    }),
                }
            }

            Ok((segments, coplanar))
        })
        .collect();

    let mut segments = Vec::new();
    let mut coplanar_pairs = Vec::new();
    for result in per_a {
        let (s, c) = result?;
        segments.extend(s);
        coplanar_pairs.extend(c);
    }

    // Deterministic ordering per the concurrency contract (§5): canonicalize
    // before the Graph Builder sees these.
    segments.sort_by(|p, q| (p.a_triangle, p.b_triangle).cmp(&(q.a_triangle, q.b_triangle)));

    Ok(FinderOutput { segments, coplanar_pairs })
}

enum PairResult {
    None,
    Coplanar,
    Segment(RawPoint, RawPoint),
}

#[allow(clippy::too_many_arguments)]
fn classify_pair(
    a_idx: usize,
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    a2: &Point3<f64>,
    b_idx: usize,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
    b2: &Point3<f64>,
    eps: &DerivedEpsilons,
    angle_epsilon: f64,
) -> Result<PairResult> {
    let normal_a = match triangle_normal(a0, a1, a2) {
        Some(n) => n,
        None => return Ok(PairResult::None),
    };
    let normal_b = match triangle_normal(b0, b1, b2) {
        Some(n) => n,
        None => return Ok(PairResult::None),
    };

    let raw_cross = normal_a.cross(&normal_b);
    let cross_norm = raw_cross.norm();
    if cross_norm < angle_epsilon {
        // Parallel planes: either coincident (coplanar) or disjoint.
        let plane_d_b = normal_b.dot(&b0.coords);
        if classify_point_plane(a0, &normal_b, plane_d_b, eps.plane_side_epsilon) != PlaneSide::On {
            return Ok(PairResult::None);
        }
        return classify_coplanar(a_idx, a0, a1, a2, b_idx, b0, b1, b2, eps);
    }

    // Past this point the planes are genuinely transversal, so `cross_norm`
    // is bounded away from zero; normalize so the interval parameter below
    // is a true distance along the shared line, matching `plane_side_epsilon`.
    let cross = raw_cross / cross_norm;

    let d_a = [
        signed_distance(a0, &normal_b, b0),
        signed_distance(a1, &normal_b, b0),
        signed_distance(a2, &normal_b, b0),
    ];
    let d_b = [
        signed_distance(b0, &normal_a, a0),
        signed_distance(b1, &normal_a, a0),
        signed_distance(b2, &normal_a, a0),
    ];

    let interval_a = match triangle_plane_interval([*a0, *a1, *a2], d_a, &cross, eps.plane_side_epsilon) {
        Some(interval) => interval,
        None => return Ok(PairResult::None),
    };
    let interval_b = match triangle_plane_interval([*b0, *b1, *b2], d_b, &cross, eps.plane_side_epsilon) {
        Some(interval) => interval,
        None => return Ok(PairResult::None),
    };

    let lo = interval_a.t0.max(interval_b.t0);
    let hi = interval_a.t1.min(interval_b.t1);
    if hi - lo <= eps.plane_side_epsilon {
        return Ok(PairResult::None);
    }

    let start = interpolate(&interval_a, lo);
    let end = interpolate(&interval_a, hi);

    let bary_a_start = barycentric_coordinates(&start, a0, a1, a2);
    let bary_a_end = barycentric_coordinates(&end, a0, a1, a2);
    let bary_b_start = barycentric_coordinates(&start, b0, b1, b2);
    let bary_b_end = barycentric_coordinates(&end, b0, b1, b2);

    let (bary_a_start, bary_a_end, bary_b_start, bary_b_end) =
        match (bary_a_start, bary_a_end, bary_b_start, bary_b_end) {
            (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
            _ => return Ok(PairResult::None),
        };

    let _ = (a_idx, b_idx);
    Ok(PairResult::Segment(
        RawPoint {
            position: start,
            bary_a: bary_a_start,
            bary_b: bary_b_start,
        },
        RawPoint {
            position: end,
            bary_a: bary_a_end,
            bary_b: bary_b_end,
        },
    ))
}

fn signed_distance(p: &Point3<f64>, plane_normal: &Vector3<f64>, plane_point: &Point3<f64>) -> f64 {
    plane_normal.dot(&(p - plane_point))
}

struct Interval {
    t0: f64,
    t1: f64,
    p0: Point3<f64>,
    p1: Point3<f64>,
}

/// Find where triangle `tri` crosses the plane whose signed distances at its
/// corners are `d`, expressed as a parameter interval along `dir`.
fn triangle_plane_interval(tri: [Point3<f64>; 3], d: [f64; 3], dir: &Vector3<f64>, eps: f64) -> Option<Interval> {
    let sign = |v: f64| -> i8 {
        if v > eps {
            1
        } else if v < -eps {
            -1
        } else {
            0
        }
    };
    let s = [sign(d[0]), sign(d[1]), sign(d[2])];

    if s[0] == s[1] && s[1] == s[2] && s[0] != 0 {
        return None;
    }

    let isolated = (0..3).find(|&i| {
        let j = (i + 1) % 3;
        let k = (i + 2) % 3;
        s[i] != 0 && s[i] != s[j] && s[i] != s[k] && s[j] == s[k]
    })?;

    let j = (isolated + 1) % 3;
    let k = (isolated + 2) % 3;

    let t_ij = d[isolated] / (d[isolated] - d[j]);
    let t_ik = d[isolated] / (d[isolated] - d[k]);
    let p_ij = tri[isolated] + t_ij * (tri[j] - tri[isolated]);
    let p_ik = tri[isolated] + t_ik * (tri[k] - tri[isolated]);

    let param_ij = dir.dot(&p_ij.coords);
    let param_ik = dir.dot(&p_ik.coords);

    if param_ij <= param_ik {
        Some(Interval {
            t0: param_ij,
            t1: param_ik,
            p0: p_ij,
            p1: p_ik,
        })
    } else {
        Some(Interval {
            t0: param_ik,
            t1: param_ij,
            p0: p_ik,
            p1: p_ij,
        })
    }
}

fn interpolate(interval: &Interval, t: f64) -> Point3<f64> {
    let span = interval.t1 - interval.t0;
    if span.abs() < f64::EPSILON {
        return interval.p0;
    }
    let ratio = (t - interval.t0) / span;
    interval.p0 + ratio * (interval.p1 - interval.p0)
}

/// Two coplanar triangles: estimate their overlap area via Sutherland-Hodgman
/// clipping in the shared plane. A negligible overlap (touching edge/corner)
/// is dropped with no evidence at all; a full coincident face (the two
/// triangles share the same footprint, wound either way) is recorded as a
/// coplanar pair so the Classifier's on-boundary perturbation drops both
/// copies instead of cutting them. Only a genuine partial overlap, too big
/// to be either of those, is unsupported (§9 open question 1).
#[allow(clippy::too_many_arguments)]
fn classify_coplanar(
    a_idx: usize,
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    a2: &Point3<f64>,
    b_idx: usize,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
    b2: &Point3<f64>,
    eps: &DerivedEpsilons,
) -> Result<PairResult> {
    let overlap_area = clipped_overlap_area(a0, a1, a2, b0, b1, b2);
    let area_a = triangle_area(a0, a1, a2);
    let area_b = triangle_area(b0, b1, b2);
    let tolerance = (area_a.min(area_b) * 1e-6).max(eps.merge_epsilon);

    if overlap_area <= tolerance {
        return Ok(PairResult::Coplanar);
    }

    if (overlap_area - area_a).abs() <= tolerance && (overlap_area - area_b).abs() <= tolerance {
        return Ok(PairResult::Coplanar);
    }

    Err(BooleanError::CoplanarOverlapUnsupported {
        triangle_a: a_idx,
        triangle_b: b_idx,
    })
}

/// Area of the polygon formed by clipping triangle (b0,b1,b2) against the
/// half-planes of triangle (a0,a1,a2), both projected into the shared plane.
fn clipped_overlap_area(
    a0: &Point3<f64>,
    a1: &Point3<f64>,
    a2: &Point3<f64>,
    b0: &Point3<f64>,
    b1: &Point3<f64>,
    b2: &Point3<f64>,
) -> f64 {
    let normal = match triangle_normal(a0, a1, a2) {
        Some(n) => n,
        None => return 0.0,
    };
    let (u_axis, v_axis) = orthonormal_basis(&normal);
    let to_uv = |p: &Point3<f64>| -> (f64, f64) {
        let rel = p - a0;
        (rel.dot(&u_axis), rel.dot(&v_axis))
    };

    let subject = vec![to_uv(b0), to_uv(b1), to_uv(b2)];
    let clip = vec![to_uv(a0), to_uv(a1), to_uv(a2)];

    let clipped = sutherland_hodgman(&subject, &clip);
    polygon_area(&clipped)
}

fn orthonormal_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if normal.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    let u = normal.cross(&helper).normalize();
    let v = normal.cross(&u).normalize();
    (u, v)
}

fn sutherland_hodgman(subject: &[(f64, f64)], clip: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut output = subject.to_vec();

    for i in 0..clip.len() {
        if output.is_empty() {
            break;
        }
        let edge_start = clip[i];
        let edge_end = clip[(i + 1) % clip.len()];
        let input = output;
        output = Vec::new();

        for j in 0..input.len() {
            let current = input[j];
            let previous = input[(j + input.len() - 1) % input.len()];

            let current_inside = is_inside(&edge_start, &edge_end, &current);
            let previous_inside = is_inside(&edge_start, &edge_end, &previous);

            if current_inside {
                if !previous_inside {
                    output.push(line_intersection(&previous, &current, &edge_start, &edge_end));
                }
                output.push(current);
            } else if previous_inside {
                output.push(line_intersection(&previous, &current, &edge_start, &edge_end));
            }
        }
    }

    output
}

fn is_inside(edge_start: &(f64, f64), edge_end: &(f64, f64), p: &(f64, f64)) -> bool {
    let edge = (edge_end.0 - edge_start.0, edge_end.1 - edge_start.1);
    let to_p = (p.0 - edge_start.0, p.1 - edge_start.1);
    edge.0 * to_p.1 - edge.1 * to_p.0 >= 0.0
}

fn line_intersection(a: &(f64, f64), b: &(f64, f64), c: &(f64, f64), d: &(f64, f64)) -> (f64, f64) {
    let a1 = b.1 - a.1;
    let b1 = a.0 - b.0;
    let c1 = a1 * a.0 + b1 * a.1;

    let a2 = d.1 - c.1;
    let b2 = c.0 - d.0;
    let c2 = a2 * c.0 + b2 * c.1;

    let det = a1 * b2 - a2 * b1;
    if det.abs() < 1e-15 {
        return *a;
    }
    ((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det)
}

fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        sum += x0 * y1 - x1 * y0;
    }
    (sum / 2.0).abs()
}
