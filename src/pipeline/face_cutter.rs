// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 4: the planar-straight-line-graph core. For every original
//! triangle carrying intersection evidence, project it into a 2D chart,
//! build a half-edge complex, extract faces (with holes), triangulate, and
//! lift the result back to 3D as patches.

use crate::error::{BooleanError, Result};
use crate::geometry::Mesh;
use crate::pipeline::graph_builder::IntersectionGraph;
use crate::pipeline::Side;
use crate::tolerance::DerivedEpsilons;
use nalgebra::Point3;
use rayon::prelude::*;

/// A 3D triangle produced by cutting an original input triangle.
#[derive(Debug, Clone, Copy)]
pub struct Patch {
    pub vertices: [Point3<f64>; 3],
    pub source_triangle: usize,
    pub side: Side,
}

pub fn cut(mesh_a: &Mesh, mesh_b: &Mesh, graph: &IntersectionGraph, eps: &DerivedEpsilons, area_epsilon: f64) -> Result<Vec<Patch>> {
    let a_results: Vec<Result<Vec<Patch>>> = mesh_a
        .triangles
        .par_iter()
        .enumerate()
        .map(|(idx, _)| cut_triangle(mesh_a, graph, idx, Side::A, eps, area_epsilon))
        .collect();

    let b_results: Vec<Result<Vec<Patch>>> = mesh_b
        .triangles
        .par_iter()
        .enumerate()
        .map(|(idx, _)| cut_triangle(mesh_b, graph, idx, Side::B, eps, area_epsilon))
        .collect();

    let mut patches = Vec::new();
    // Deterministic ordering by original triangle id (§5).
    for result in a_results {
        patches.extend(result?);
    }
    for result in b_results {
        patches.extend(result?);
    }

    Ok(patches)
}

#[derive(Clone, Copy)]
struct VertexRecord {
    uv: (f64, f64),
    position: Point3<f64>,
}

struct PslgEdge {
    v0: usize,
    v1: usize,
}

fn cut_triangle(
    mesh: &Mesh,
    graph: &IntersectionGraph,
    triangle_idx: usize,
    side: Side,
    eps: &DerivedEpsilons,
    area_epsilon: f64,
) -> Result<Vec<Patch>> {
    let triangle = &mesh.triangles[triangle_idx];
    let (c0, c1, c2) = mesh.triangle_positions(triangle);
    let area3d = crate::geometry::triangle_area(&c0, &c1, &c2);

    if area3d <= area_epsilon {
        return Ok(vec![Patch { vertices: [c0, c1, c2], source_triangle: triangle_idx, side }]);
    }

    let evidence = match side {
        Side::A => graph.evidence_a.get(&triangle_idx),
        Side::B => graph.evidence_b.get(&triangle_idx),
    };
    let evidence = match evidence {
        Some(e) if !e.vertex_ids.is_empty() => e,
        _ => return Ok(vec![Patch { vertices: [c0, c1, c2], source_triangle: triangle_idx, side }]),
    };

    let uv_scale = 2.0 * area3d;
    let uv_epsilon = (area_epsilon / uv_scale).max(1e-15);
    let barycentric_epsilon = eps.barycentric_epsilon;

    let mut records = vec![
        VertexRecord { uv: (0.0, 0.0), position: c0 },
        VertexRecord { uv: (1.0, 0.0), position: c1 },
        VertexRecord { uv: (0.0, 1.0), position: c2 },
    ];
    let mut global_to_local: Vec<(u32, usize)> = Vec::new();

    for &vertex_id in &evidence.vertex_ids {
        let vertex = graph.vertex(vertex_id);
        let bary_table = match side {
            Side::A => &vertex.bary_a,
            Side::B => &vertex.bary_b,
        };
        let bary = bary_table
            .entries
            .iter()
            .find(|(t, _)| *t == triangle_idx)
            .map(|(_, bary)| *bary);

        let (_, v, w) = match bary {
            Some(bary) => bary,
            None => continue,
        };
        let uv = (v, w);

        if let Some(existing) = find_coincident(&records, uv, barycentric_epsilon) {
            global_to_local.push((vertex_id, existing));
            continue;
        }

        let local = records.len();
        records.push(VertexRecord { uv, position: vertex.position });
        global_to_local.push((vertex_id, local));
    }

    let lookup_global = |id: u32| -> Option<usize> { global_to_local.iter().find(|(v, _)| *v == id).map(|(_, l)| *l) };

    let mut pslg_edges: Vec<PslgEdge> = Vec::new();

    // Boundary chains: corner0-corner1 (w=0), corner1-corner2 (u=0, i.e. v+w=1), corner2-corner0 (v=0).
    build_boundary_chain(&records, &mut pslg_edges, 0, 1, |uv| uv.1, barycentric_epsilon);
    build_boundary_chain(&records, &mut pslg_edges, 1, 2, |uv| 1.0 - uv.0 - uv.1, barycentric_epsilon);
    build_boundary_chain(&records, &mut pslg_edges, 2, 0, |uv| uv.0, barycentric_epsilon);

    for &edge_id in &evidence.edge_ids {
        let edge = graph.edge(edge_id);
        if let (Some(v0), Some(v1)) = (lookup_global(edge.v0), lookup_global(edge.v1)) {
            if v0 != v1 {
                pslg_edges.push(PslgEdge { v0, v1 });
            }
        }
    }

    let cycles = trace_cycles(&records, &pslg_edges);
    if cycles.is_empty() {
        return Ok(vec![Patch { vertices: [c0, c1, c2], source_triangle: triangle_idx, side }]);
    }

    let faces = nest_into_faces(&records, &cycles);

    let mut total_area = 0.0;
    let mut kept_faces = Vec::new();
    for face in faces {
        let outer_area = polygon_area(&records, &face.outer);
        let holes_area: f64 = face.holes.iter().map(|h| polygon_area(&records, h)).sum();
        let net_area = outer_area - holes_area;
        if net_area.abs() <= uv_epsilon {
            continue;
        }
        total_area += net_area;
        kept_faces.push(face);
    }

    if (total_area - 0.5).abs() > uv_epsilon.max(1e-9) * 10.0 {
        return Err(BooleanError::AreaConservationViolated {
            triangle: triangle_idx,
            expected: 0.5 * uv_scale,
            actual: total_area * uv_scale,
        });
    }

    let mut patches = Vec::new();
    for face in kept_faces {
        let polygon = stitch_holes(&records, &face.outer, &face.holes);
        let triangles = ear_clip(&records, &polygon);
        for [i, j, k] in triangles {
            patches.push(Patch {
                vertices: [records[i].position, records[j].position, records[k].position],
                source_triangle: triangle_idx,
                side,
            });
        }
    }

    Ok(patches)
}

fn find_coincident(records: &[VertexRecord], uv: (f64, f64), epsilon: f64) -> Option<usize> {
    records.iter().position(|r| {
        let dx = r.uv.0 - uv.0;
        let dy = r.uv.1 - uv.1;
        (dx * dx + dy * dy).sqrt() <= epsilon
    })
}

fn build_boundary_chain(
    records: &[VertexRecord],
    edges: &mut Vec<PslgEdge>,
    start_corner: usize,
    end_corner: usize,
    coord_on_edge: impl Fn((f64, f64)) -> f64,
    epsilon: f64,
) {
    let mut on_edge: Vec<(usize, f64)> = Vec::new();
    let start_uv = records[start_corner].uv;

    for (idx, record) in records.iter().enumerate() {
        if coord_on_edge(record.uv).abs() > epsilon {
            continue;
        }
        let dx = record.uv.0 - start_uv.0;
        let dy = record.uv.1 - start_uv.1;
        let param = (dx * dx + dy * dy).sqrt();
        on_edge.push((idx, param));
    }

    on_edge.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    on_edge.dedup_by(|a, b| a.0 == b.0);

    if on_edge.is_empty() || on_edge.first().map(|(i, _)| *i) != Some(start_corner) {
        on_edge.insert(0, (start_corner, 0.0));
    }
    if on_edge.last().map(|(i, _)| *i) != Some(end_corner) {
        let end_uv = records[end_corner].uv;
        let dx = end_uv.0 - start_uv.0;
        let dy = end_uv.1 - start_uv.1;
        on_edge.push((end_corner, (dx * dx + dy * dy).sqrt()));
    }

    for pair in on_edge.windows(2) {
        if pair[0].0 != pair[1].0 {
            edges.push(PslgEdge { v0: pair[0].0, v1: pair[1].0 });
        }
    }
}

struct Cycle {
    vertices: Vec<usize>,
    raw_signed_area: f64,
}

fn trace_cycles(records: &[VertexRecord], edges: &[PslgEdge]) -> Vec<Cycle> {
    struct HalfEdge {
        from: usize,
        to: usize,
        twin: usize,
        next: usize,
    }

    let mut half_edges: Vec<HalfEdge> = Vec::with_capacity(edges.len() * 2);
    for edge in edges {
        let a = half_edges.len();
        let b = a + 1;
        half_edges.push(HalfEdge { from: edge.v0, to: edge.v1, twin: b, next: usize::MAX });
        half_edges.push(HalfEdge { from: edge.v1, to: edge.v0, twin: a, next: usize::MAX });
    }

    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    for (idx, he) in half_edges.iter().enumerate() {
        outgoing[he.from].push(idx);
    }
    for list in outgoing.iter_mut() {
        list.sort_by(|&i, &j| {
            let angle = |he_idx: usize| -> f64 {
                let he = &half_edges[he_idx];
                let from = records[he.from].uv;
                let to = records[he.to].uv;
                (to.1 - from.1).atan2(to.0 - from.0)
            };
            angle(i).partial_cmp(&angle(j)).unwrap()
        });
    }

    let next_indices: Vec<usize> = (0..half_edges.len())
        .map(|idx| {
            let twin = half_edges[idx].twin;
            let dest = half_edges[twin].from;
            let list = &outgoing[dest];
            let pos = list.iter().position(|&e| e == twin).unwrap();
            list[(pos + 1) % list.len()]
        })
        .collect();
    for (idx, next) in next_indices.into_iter().enumerate() {
        half_edges[idx].next = next;
    }

    let mut visited = vec![false; half_edges.len()];
    let mut cycles = Vec::new();

    for start in 0..half_edges.len() {
        if visited[start] {
            continue;
        }
        let mut path = Vec::new();
        let mut current = start;
        loop {
            if visited[current] {
                break;
            }
            visited[current] = true;
            path.push(half_edges[current].from);
            current = half_edges[current].next;
            if current == start {
                break;
            }
        }
        if path.len() >= 3 {
            let raw_signed_area = signed_area(records, &path);
            cycles.push(Cycle { vertices: path, raw_signed_area });
        }
    }

    cycles
}

fn signed_area(records: &[VertexRecord], cycle: &[usize]) -> f64 {
    let mut sum = 0.0;
    for i in 0..cycle.len() {
        let (x0, y0) = records[cycle[i]].uv;
        let (x1, y1) = records[cycle[(i + 1) % cycle.len()]].uv;
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

fn polygon_area(records: &[VertexRecord], cycle: &[usize]) -> f64 {
    signed_area(records, cycle).abs()
}

struct Face {
    outer: Vec<usize>,
    holes: Vec<Vec<usize>>,
}

fn nest_into_faces(records: &[VertexRecord], cycles: &[Cycle]) -> Vec<Face> {
    if cycles.len() == 1 {
        let mut outer = cycles[0].vertices.clone();
        if cycles[0].raw_signed_area < 0.0 {
            outer.reverse();
        }
        return vec![Face { outer, holes: vec![] }];
    }

    let unbounded_idx = pick_unbounded(records, cycles);

    // Each disconnected PSLG component (e.g. a hole loop with no edge
    // touching the outer boundary) traces its own CCW/CW cycle pair. Only
    // one CW cycle overall is the genuine unbounded face; every other
    // negative-area cycle is that spurious per-component "exterior" twin
    // of a CCW cycle already in this list and carries no new region, so it
    // is dropped rather than reversed into a duplicate face candidate.
    let live: Vec<usize> = (0..cycles.len())
        .filter(|&i| Some(i) != unbounded_idx && cycles[i].raw_signed_area > 0.0)
        .collect();

    let polygons: Vec<&Vec<usize>> = live.iter().map(|&i| &cycles[i].vertices).collect();
    let samples: Vec<(f64, f64)> = polygons.iter().map(|c| interior_sample(records, c)).collect();
    let areas: Vec<f64> = polygons.iter().map(|c| polygon_area(records, c)).collect();

    let mut parent: Vec<Option<usize>> = vec![None; live.len()];
    for i in 0..live.len() {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..live.len() {
            if i == j {
                continue;
            }
            if point_in_polygon(records, polygons[j], samples[i]) {
                if best.map(|(_, a)| areas[j] < a).unwrap_or(true) {
                    best = Some((j, areas[j]));
                }
            }
        }
        parent[i] = best.map(|(j, _)| j);
    }

    // Every nesting level becomes its own output face, holed out by its
    // direct children one level down. This is not an even/odd fill rule:
    // a hole's own interior is just as real a patch as the ring around it
    // (the opposite mesh may classify the two differently), so each cycle
    // is emitted regardless of depth. Net areas telescope back to the full
    // chart area: (A0-A1) + (A1-A2) + ... + An = A0.
    let mut faces = Vec::new();
    for i in 0..live.len() {
        let holes: Vec<Vec<usize>> = (0..live.len()).filter(|&j| parent[j] == Some(i)).map(|j| polygons[j].clone()).collect();
        faces.push(Face { outer: polygons[i].clone(), holes });
    }

    faces
}

fn pick_unbounded(records: &[VertexRecord], cycles: &[Cycle]) -> Option<usize> {
    let negative: Vec<usize> = (0..cycles.len()).filter(|&i| cycles[i].raw_signed_area < 0.0).collect();
    if !negative.is_empty() {
        return negative
            .into_iter()
            .max_by(|&a, &b| polygon_area(records, &cycles[a].vertices).partial_cmp(&polygon_area(records, &cycles[b].vertices)).unwrap());
    }
    (0..cycles.len()).max_by(|&a, &b| {
        polygon_area(records, &cycles[a].vertices)
            .partial_cmp(&polygon_area(records, &cycles[b].vertices))
            .unwrap()
    })
}

fn interior_sample(records: &[VertexRecord], cycle: &[usize]) -> (f64, f64) {
    let n = cycle.len();
    for i in 0..n {
        let prev = records[cycle[(i + n - 1) % n]].uv;
        let cur = records[cycle[i]].uv;
        let next = records[cycle[(i + 1) % n]].uv;
        if !is_convex(prev, cur, next) {
            continue;
        }
        let contains_other = (0..n).any(|k| {
            let idx = cycle[k];
            idx != cycle[i] && idx != cycle[(i + n - 1) % n] && idx != cycle[(i + 1) % n] && point_in_triangle(prev, cur, next, records[idx].uv)
        });
        if !contains_other {
            return ((prev.0 + cur.0 + next.0) / 3.0, (prev.1 + cur.1 + next.1) / 3.0);
        }
    }
    let (sx, sy) = cycle.iter().fold((0.0, 0.0), |(sx, sy), &idx| (sx + records[idx].uv.0, sy + records[idx].uv.1));
    (sx / n as f64, sy / n as f64)
}

fn is_convex(prev: (f64, f64), cur: (f64, f64), next: (f64, f64)) -> bool {
    cross(prev, cur, next) > 0.0
}

fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn point_in_triangle(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn point_in_polygon(records: &[VertexRecord], polygon: &[usize], p: (f64, f64)) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = records[polygon[i]].uv;
        let vj = records[polygon[j]].uv;
        if (vi.1 > p.1) != (vj.1 > p.1) {
            let x_intersect = (vj.0 - vi.0) * (p.1 - vi.1) / (vj.1 - vi.1) + vi.0;
            if p.0 < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Merge an outer boundary with its holes into one simple polygon via
/// bridge edges, so ear clipping can run on a single cycle.
fn stitch_holes(records: &[VertexRecord], outer: &[usize], holes: &[Vec<usize>]) -> Vec<usize> {
    let mut polygon = outer.to_vec();

    for hole in holes {
        let hole_start = hole
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| {
                let ua = records[a].uv;
                let ub = records[b].uv;
                ua.0.partial_cmp(&ub.0).unwrap().then(ua.1.partial_cmp(&ub.1).unwrap())
            })
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut rotated_hole = hole[hole_start..].to_vec();
        rotated_hole.extend_from_slice(&hole[..hole_start]);

        let hole_point = records[rotated_hole[0]].uv;
        let mut candidates: Vec<usize> = (0..polygon.len()).collect();
        candidates.sort_by(|&i, &j| {
            let da = distance(records[polygon[i]].uv, hole_point);
            let db = distance(records[polygon[j]].uv, hole_point);
            da.partial_cmp(&db).unwrap()
        });

        let bridge_pos = candidates
            .into_iter()
            .find(|&i| bridge_is_clear(records, &polygon, polygon[i], rotated_hole[0]))
            .unwrap_or(0);

        let mut merged = Vec::with_capacity(polygon.len() + rotated_hole.len() + 2);
        merged.extend_from_slice(&polygon[..=bridge_pos]);
        merged.extend_from_slice(&rotated_hole);
        merged.push(rotated_hole[0]);
        merged.push(polygon[bridge_pos]);
        merged.extend_from_slice(&polygon[bridge_pos + 1..]);
        polygon = merged;
    }

    polygon
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn bridge_is_clear(records: &[VertexRecord], polygon: &[usize], outer_vertex: usize, hole_vertex: usize) -> bool {
    let p0 = records[outer_vertex].uv;
    let p1 = records[hole_vertex].uv;
    let n = polygon.len();
    for i in 0..n {
        let a = records[polygon[i]].uv;
        let b = records[polygon[(i + 1) % n]].uv;
        if polygon[i] == outer_vertex || polygon[(i + 1) % n] == outer_vertex {
            continue;
        }
        if segments_intersect(p0, p1, a, b) {
            return false;
        }
    }
    true
}

fn segments_intersect(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), p4: (f64, f64)) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

/// Simple O(n^2) ear clipping over a closed polygon of PSLG vertex indices.
fn ear_clip(records: &[VertexRecord], polygon: &[usize]) -> Vec<[usize; 3]> {
    let mut remaining = polygon.to_vec();
    let mut triangles = Vec::new();

    let mut guard = 0;
    while remaining.len() > 3 && guard < polygon.len() * polygon.len() + 16 {
        guard += 1;
        let n = remaining.len();
        let mut clipped = false;

        for i in 0..n {
            let prev = remaining[(i + n - 1) % n];
            let cur = remaining[i];
            let next = remaining[(i + 1) % n];

            let a = records[prev].uv;
            let b = records[cur].uv;
            let c = records[next].uv;

            if !is_convex(a, b, c) {
                continue;
            }

            let is_ear = !remaining.iter().enumerate().any(|(k, &idx)| {
                k != (i + n - 1) % n && k != i && k != (i + 1) % n && point_in_triangle(a, b, c, records[idx].uv)
            });

            if is_ear {
                triangles.push([prev, cur, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            break;
        }
    }

    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }

    triangles
}
