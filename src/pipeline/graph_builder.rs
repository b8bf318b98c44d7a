// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Stage 2: merge per-pair intersection points into one global vertex set,
//! dedupe segments into undirected edges, and index which vertices/edges
//! land on each original triangle.

use crate::error::{BooleanError, Result};
use crate::pipeline::intersection_finder::FinderOutput;
use crate::pipeline::spatial_hash::SpatialHash;
use crate::tolerance::DerivedEpsilons;
use ahash::AHashMap;
use nalgebra::Point3;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct TriangleBarycentrics {
    /// (triangle index, barycentric coordinates), one entry per distinct
    /// triangle this vertex has coordinates on.
    pub entries: Vec<(usize, (f64, f64, f64))>,
}

impl TriangleBarycentrics {
    fn record(&mut self, triangle: usize, bary: (f64, f64, f64)) {
        if !self.entries.iter().any(|(t, _)| *t == triangle) {
            self.entries.push((triangle, bary));
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntersectionVertex {
    pub id: u32,
    pub position: Point3<f64>,
    pub bary_a: TriangleBarycentrics,
    pub bary_b: TriangleBarycentrics,
}

#[derive(Debug, Clone)]
pub struct IntersectionEdge {
    pub id: u32,
    pub v0: u32,
    pub v1: u32,
    pub originators: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct TriangleEvidence {
    pub vertex_ids: Vec<u32>,
    pub edge_ids: Vec<u32>,
}

pub struct IntersectionGraph {
    pub vertices: Vec<IntersectionVertex>,
    pub edges: Vec<IntersectionEdge>,
    pub evidence_a: AHashMap<usize, TriangleEvidence>,
    pub evidence_b: AHashMap<usize, TriangleEvidence>,
}

impl IntersectionGraph {
    pub fn vertex(&self, id: u32) -> &IntersectionVertex {
        &self.vertices[id as usize]
    }

    pub fn edge(&self, id: u32) -> &IntersectionEdge {
        &self.edges[id as usize]
    }

    /// Whether `v0`/`v1` share an edge in the graph.
    pub fn are_adjacent(&self, v0: u32, v1: u32) -> bool {
        self.edges.iter().any(|e| {
            (e.v0 == v0 && e.v1 == v1) || (e.v0 == v1 && e.v1 == v0)
        })
    }
}

pub fn build(finder_output: &FinderOutput, eps: &DerivedEpsilons) -> Result<IntersectionGraph> {
    let mut hash = SpatialHash::new(eps.merge_epsilon);
    let mut bary_a_by_hash: AHashMap<u32, TriangleBarycentrics> = AHashMap::new();
    let mut bary_b_by_hash: AHashMap<u32, TriangleBarycentrics> = AHashMap::new();

    // Raw (hash-space) edges, deduped by unordered vertex pair.
    let mut raw_edges: AHashMap<(u32, u32), Vec<(usize, usize)>> = AHashMap::new();

    for segment in &finder_output.segments {
        let (start_id, _) = hash.insert(segment.start.position);
        let (end_id, _) = hash.insert(segment.end.position);

        bary_a_by_hash.entry(start_id).or_default().record(segment.a_triangle, segment.start.bary_a);
        bary_b_by_hash.entry(start_id).or_default().record(segment.b_triangle, segment.start.bary_b);
        bary_a_by_hash.entry(end_id).or_default().record(segment.a_triangle, segment.end.bary_a);
        bary_b_by_hash.entry(end_id).or_default().record(segment.b_triangle, segment.end.bary_b);

        if start_id == end_id {
            // Degenerate after merge: both endpoints collapsed to one point.
            continue;
        }

        let key = if start_id < end_id { (start_id, end_id) } else { (end_id, start_id) };
        let originators = raw_edges.entry(key).or_default();
        if !originators.contains(&(segment.a_triangle, segment.b_triangle)) {
            originators.push((segment.a_triangle, segment.b_triangle));
        }
    }

    // Canonicalize vertex ids by lexicographic position sort (§5).
    let hash_count = hash.len();
    let mut order: Vec<u32> = (0..hash_count as u32).collect();
    order.sort_by(|&a, &b| lex_cmp(hash.point(a), hash.point(b)));

    let mut remap = vec![0u32; hash_count];
    for (new_id, &old_id) in order.iter().enumerate() {
        remap[old_id as usize] = new_id as u32;
    }

    let mut vertices = Vec::with_capacity(hash_count);
    for &old_id in &order {
        let id = remap[old_id as usize];
        vertices.push(IntersectionVertex {
            id,
            position: *hash.point(old_id),
            bary_a: bary_a_by_hash.remove(&old_id).unwrap_or_default(),
            bary_b: bary_b_by_hash.remove(&old_id).unwrap_or_default(),
        });
    }

    let mut edge_keys: Vec<((u32, u32), Vec<(usize, usize)>)> = raw_edges.into_iter().collect();
    edge_keys.sort_by_key(|((v0, v1), _)| (remap[*v0 as usize].min(remap[*v1 as usize]), remap[*v0 as usize].max(remap[*v1 as usize])));

    let mut edges = Vec::with_capacity(edge_keys.len());
    let mut evidence_a: AHashMap<usize, TriangleEvidence> = AHashMap::new();
    let mut evidence_b: AHashMap<usize, TriangleEvidence> = AHashMap::new();

    for (id, ((old_v0, old_v1), originators)) in edge_keys.into_iter().enumerate() {
        let v0 = remap[old_v0 as usize];
        let v1 = remap[old_v1 as usize];

        let a_triangles: HashSet<usize> = originators.iter().map(|(a, _)| *a).collect();
        let b_triangles: HashSet<usize> = originators.iter().map(|(_, b)| *b).collect();
        if a_triangles.len() > 1 {
            return Err(BooleanError::DuplicateGraphEdge { edge: (v0, v1) });
        }
        if b_triangles.len() > 1 {
            return Err(BooleanError::DuplicateGraphEdge { edge: (v0, v1) });
        }

        let edge_id = id as u32;
        edges.push(IntersectionEdge {
            id: edge_id,
            v0,
            v1,
            originators: originators.clone(),
        });

        for (a_tri, b_tri) in originators {
            let evidence = evidence_a.entry(a_tri).or_default();
            if !evidence.vertex_ids.contains(&v0) {
                evidence.vertex_ids.push(v0);
            }
            if !evidence.vertex_ids.contains(&v1) {
                evidence.vertex_ids.push(v1);
            }
            evidence.edge_ids.push(edge_id);

            let evidence = evidence_b.entry(b_tri).or_default();
            if !evidence.vertex_ids.contains(&v0) {
                evidence.vertex_ids.push(v0);
            }
            if !evidence.vertex_ids.contains(&v1) {
                evidence.vertex_ids.push(v1);
            }
            evidence.edge_ids.push(edge_id);
        }
    }

    Ok(IntersectionGraph {
        vertices,
        edges,
        evidence_a,
        evidence_b,
    })
}

fn lex_cmp(a: &Point3<f64>, b: &Point3<f64>) -> std::cmp::Ordering {
    (a.x, a.y, a.z)
        .partial_cmp(&(b.x, b.y, b.z))
        .unwrap_or(std::cmp::Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::intersection_finder::RawPoint;
    use crate::tolerance::ToleranceBundle;

    fn point(x: f64, y: f64, z: f64) -> RawPoint {
        RawPoint {
            position: Point3::new(x, y, z),
            bary_a: (1.0, 0.0, 0.0),
            bary_b: (1.0, 0.0, 0.0),
        }
    }

    #[test]
    fn merges_coincident_endpoints_across_segments() {
        use crate::pipeline::intersection_finder::RawSegment;

        let shared = point(0.5, 0.5, 0.0);
        let other_end_1 = point(1.0, 0.0, 0.0);
        let other_end_2 = point(0.0, 1.0, 0.0);

        let output = FinderOutput {
            segments: vec![
                RawSegment { a_triangle: 0, b_triangle: 0, start: shared, end: other_end_1 },
                RawSegment { a_triangle: 0, b_triangle: 1, start: shared, end: other_end_2 },
            ],
            coplanar_pairs: vec![],
        };

        let eps = ToleranceBundle::reference().derived(1.0);
        let graph = build(&output, &eps).unwrap();
        assert_eq!(graph.vertices.len(), 3);
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn duplicate_a_triangle_on_same_edge_errors() {
        use crate::pipeline::intersection_finder::RawSegment;

        let p0 = point(0.0, 0.0, 0.0);
        let p1 = point(1.0, 0.0, 0.0);

        let output = FinderOutput {
            segments: vec![
                RawSegment { a_triangle: 0, b_triangle: 0, start: p0, end: p1 },
                RawSegment { a_triangle: 1, b_triangle: 0, start: p0, end: p1 },
            ],
            coplanar_pairs: vec![],
        };

        let eps = ToleranceBundle::reference().derived(1.0);
        assert!(build(&output, &eps).is_err());
    }
}
