// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy for spatial acceleration.
//! Shared broad-phase index for the Intersection Finder (triangle-pair
//! candidates) and the Classifier (ray-vs-triangle candidates).

use super::BoundingBox;
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone)]
enum BvhNode {
    Leaf {
        bbox: BoundingBox,
        items: Vec<usize>,
    },
    Internal {
        bbox: BoundingBox,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn bbox(&self) -> &BoundingBox {
        match self {
            BvhNode::Leaf { bbox, .. } => bbox,
            BvhNode::Internal { bbox, .. } => bbox,
        }
    }
}

/// A read-only bounding volume hierarchy over a fixed item set (triangle
/// indices on one mesh side). Built once per side; queried many times from
/// parallel stages, never mutated — safe to share behind `&Bvh`.
pub struct Bvh {
    root: BvhNode,
}

const MAX_DEPTH: usize = 32;
const LEAF_SIZE: usize = 4;

impl Bvh {
    /// Build from (item index, bounding box) pairs. `item` is typically a
    /// triangle index into the owning mesh's triangle list.
    pub fn build(items: Vec<(usize, BoundingBox)>) -> Self {
        if items.is_empty() {
            return Self {
                root: BvhNode::Leaf {
                    bbox: BoundingBox::empty(),
                    items: Vec::new(),
                },
            };
        }
        Self {
            root: Self::build_recursive(items, 0),
        }
    }

    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BvhNode {
        if items.len() <= LEAF_SIZE || depth >= MAX_DEPTH {
            let bbox = Self::union_all(&items);
            return BvhNode::Leaf {
                bbox,
                items: items.into_iter().map(|(idx, _)| idx).collect(),
            };
        }

        let axis = Self::longest_axis(&items);
        items.sort_by(|(_, a), (_, b)| {
            let ca = a.center();
            let cb = b.center();
            let (va, vb) = match axis {
                0 => (ca.x, cb.x),
                1 => (ca.y, cb.y),
                _ => (ca.z, cb.z),
            };
            va.partial_cmp(&vb).unwrap()
        });

        let mid = items.len() / 2;
        let right_items = items.split_off(mid);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));
        let bbox = left.bbox().union(right.bbox());

        BvhNode::Internal { bbox, left, right }
    }

    fn longest_axis(items: &[(usize, BoundingBox)]) -> usize {
        let bbox = Self::union_all(items);
        let size = bbox.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    fn union_all(items: &[(usize, BoundingBox)]) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for (_, b) in items {
            bbox = bbox.union(b);
        }
        bbox
    }

    /// All items whose bounding box intersects `query`.
    pub fn query(&self, query: &BoundingBox) -> Vec<usize> {
        let mut out = Vec::new();
        Self::query_recursive(&self.root, query, &mut out);
        out
    }

    fn query_recursive(node: &BvhNode, query: &BoundingBox, out: &mut Vec<usize>) {
        if !node.bbox().intersects(query) {
            return;
        }
        match node {
            BvhNode::Leaf { items, .. } => out.extend_from_slice(items),
            BvhNode::Internal { left, right, .. } => {
                Self::query_recursive(left, query, out);
                Self::query_recursive(right, query, out);
            }
        }
    }

    /// Items whose bounding box intersects a ray, approximated by a box
    /// spanning from `origin` to `origin + dir * max_distance`, inflated by
    /// `margin` — used by the Classifier's ray-cast broad phase.
    pub fn query_ray(&self, origin: &Point3<f64>, dir: &Vector3<f64>, max_distance: f64, margin: f64) -> Vec<usize> {
        let far = origin + dir * max_distance;
        let query = BoundingBox::from_triangle(origin, &far, &far).inflated(margin);
        self.query(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::cube;
    use nalgebra::Vector3;

    fn triangle_items(mesh: &crate::geometry::Mesh) -> Vec<(usize, BoundingBox)> {
        mesh.triangles
            .iter()
            .enumerate()
            .map(|(idx, tri)| {
                let (a, b, c) = mesh.triangle_positions(tri);
                (idx, BoundingBox::from_triangle(&a, &b, &c))
            })
            .collect()
    }

    #[test]
    fn query_with_full_bbox_returns_all_triangles() {
        let mesh = cube(Vector3::new(10.0, 10.0, 10.0), false);
        let bvh = Bvh::build(triangle_items(&mesh));
        let results = bvh.query(&mesh.bounding_box());
        assert_eq!(results.len(), mesh.triangle_count());
    }

    #[test]
    fn query_with_disjoint_bbox_returns_nothing() {
        let mesh = cube(Vector3::new(1.0, 1.0, 1.0), false);
        let bvh = Bvh::build(triangle_items(&mesh));
        let far = BoundingBox::new(Point3::new(100.0, 100.0, 100.0), Point3::new(101.0, 101.0, 101.0));
        assert!(bvh.query(&far).is_empty());
    }
}
