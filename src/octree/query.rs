//! Intersection and ray queries.

use super::Octree;
use super::node::{NodeIndex, ROOT};
use crate::errors::CsgError;
use crate::float_types::Real;
use crate::geometry::aabb::AabbExt;
use crate::geometry::ray::{Ray, intersect_triangle};
use crate::geometry::tri_tri::triangles_intersect;
use crate::mesh::polygon::{Polygon, PolygonId};
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A ray/polygon hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit (distance for a unit direction).
    pub distance: Real,
    pub point: Point3<Real>,
    pub polygon: PolygonId,
    /// Plane normal of the hit polygon.
    pub normal: Vector3<Real>,
}

impl Octree {
    fn require_box(&self) -> Result<(), CsgError> {
        if self.bounding_box().is_none() && !self.polygons.is_empty() {
            return Err(CsgError::MissingBoundingBox);
        }
        Ok(())
    }

    /// Original, valid, intersecting polygons (replaced ones included) whose
    /// triangle intersects `target`'s.
    ///
    /// Subtrees whose box does not overlap the target triangle are skipped.
    pub fn polygons_intersecting_polygon(&self, target: &Polygon) -> Result<Vec<&Polygon>, CsgError> {
        self.require_box()?;
        let triangle = target.triangle();
        let mut found = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let Some(bbox) = node.bbox else {
                continue;
            };
            if !bbox.intersects_triangle(triangle) {
                continue;
            }
            for id in node.polygons.iter().chain(&node.replaced) {
                let Some(polygon) = self.polygons.get(id) else {
                    continue;
                };
                if polygon.original_valid
                    && polygon.valid
                    && polygon.intersects
                    && triangles_intersect(triangle, polygon.triangle())
                {
                    found.push(polygon);
                }
            }
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        Ok(found)
    }

    /// Valid original polygons (replaced ones included) in every node whose box the ray crosses.
    pub fn ray_polygons(&self, ray: &Ray) -> Result<Vec<&Polygon>, CsgError> {
        self.require_box()?;
        Ok(self
            .ray_nodes(ray)
            .into_iter()
            .flat_map(|index| self.ray_candidates(index))
            .collect())
    }

    /// Every node whose box the ray crosses, parents before children.
    fn ray_nodes(&self, ray: &Ray) -> Vec<NodeIndex> {
        let mut crossed = Vec::new();
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let Some(bbox) = node.bbox else {
                continue;
            };
            if bbox.ray_distance(ray).is_none() {
                continue;
            }
            crossed.push(index);
            if let Some(children) = node.children {
                stack.extend(children);
            }
        }
        crossed
    }

    fn ray_candidates(&self, index: NodeIndex) -> impl Iterator<Item = &Polygon> + '_ {
        let node = &self.nodes[index];
        node.polygons
            .iter()
            .chain(&node.replaced)
            .filter_map(|id| self.polygons.get(id))
            .filter(|p| p.valid && p.original_valid)
    }

    /// Every hit along the ray, nearest first.
    pub fn ray_intersect(&self, ray: &Ray) -> Result<Vec<RayHit>, CsgError> {
        let mut hits: Vec<RayHit> = self
            .ray_polygons(ray)?
            .into_iter()
            .filter_map(|polygon| hit(ray, polygon))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    /// Nearest hit along the ray.
    ///
    /// Nodes are visited best-first by the distance at which the ray enters
    /// their box; the march stops as soon as the next box is farther than
    /// the best hit found so far.
    pub fn closest_ray_intersection(&self, ray: &Ray) -> Result<Option<RayHit>, CsgError> {
        self.require_box()?;
        Ok(self.march(ray).0)
    }

    /// Best-first march behind [`Octree::closest_ray_intersection`], also
    /// returning how many nodes had their polygons tested.
    fn march(&self, ray: &Ray) -> (Option<RayHit>, usize) {
        let mut best: Option<RayHit> = None;
        let mut visited = 0;
        let mut queue = BinaryHeap::new();
        if let Some(distance) = self.nodes[ROOT].bbox.and_then(|b| b.ray_distance(ray)) {
            queue.push(Candidate { distance, node: ROOT });
        }

        while let Some(Candidate { distance, node }) = queue.pop() {
            if best.is_some_and(|b| distance > b.distance) {
                break;
            }
            visited += 1;
            for polygon in self.ray_candidates(node) {
                if let Some(h) = hit(ray, polygon) {
                    if best.is_none_or(|b| h.distance < b.distance) {
                        best = Some(h);
                    }
                }
            }
            let Some(children) = self.nodes[node].children else {
                continue;
            };
            for child in children {
                let entry = self.nodes[child].bbox.and_then(|b| b.ray_distance(ray));
                if let Some(distance) = entry {
                    if best.is_none_or(|b| distance <= b.distance) {
                        queue.push(Candidate { distance, node: child });
                    }
                }
            }
        }
        (best, visited)
    }
}

fn hit(ray: &Ray, polygon: &Polygon) -> Option<RayHit> {
    intersect_triangle(ray, polygon.triangle()).map(|distance| RayHit {
        distance,
        point: ray.point_at(distance),
        polygon: polygon.id(),
        normal: polygon.plane().normal,
    })
}

/// Min-heap entry: smaller entry distance pops first.
#[derive(Debug, PartialEq)]
struct Candidate {
    distance: Real,
    node: NodeIndex,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OctreeSettings;

    fn fine_sphere() -> Octree {
        let settings = OctreeSettings {
            polygons_per_tree: 8,
            max_level: 16,
        };
        let sphere = Octree::sphere(1.0, 32, 16);
        Octree::from_polygons(sphere.polygons().into_iter().cloned(), settings)
    }

    #[test]
    fn march_skips_nodes_beyond_the_nearest_hit() {
        let octree = fine_sphere();
        let ray = Ray::new(Point3::new(-3.0, 0.05, 0.1), Vector3::x());

        let crossed = octree.ray_nodes(&ray);
        let (best, visited) = octree.march(&ray);
        let best = best.expect("ray through the sphere hits it");

        assert!(best.point.x < -0.9, "nearest hit is on the near side, got {:?}", best.point);
        assert!(visited > 0);
        assert!(visited < crossed.len(), "visited {visited} of {} crossed nodes", crossed.len());

        // every crossed node the march skipped is entered beyond the best hit
        let far = crossed
            .iter()
            .filter_map(|&i| octree.nodes[i].bbox.and_then(|b| b.ray_distance(&ray)))
            .filter(|entry| *entry > best.distance)
            .count();
        assert!(far > 0);
    }

    #[test]
    fn march_agrees_with_the_full_hit_list() {
        let octree = fine_sphere();
        let ray = Ray::new(Point3::new(-3.0, 0.05, 0.1), Vector3::x());
        let all = octree.ray_intersect(&ray).unwrap();
        let closest = octree.closest_ray_intersection(&ray).unwrap().unwrap();
        assert_eq!(all.first().map(|h| h.distance), Some(closest.distance));
        assert!(all.len() >= 2);
    }
}
