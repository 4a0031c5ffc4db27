//! Octree spatial index over the polygons of one solid.
//!
//! Nodes live in an arena ([`OctreeNode`]s addressed by [`NodeIndex`]) and
//! polygons in a map keyed by [`PolygonId`]; each node lists the ids it owns
//! and a reverse map records the owning node of every polygon, so a polygon
//! can be replaced in place without searching the tree. Iterating the arena
//! in order visits every polygon list without recursion.
//!
//! A polygon lives at the shallowest node whose box fully contains it: during
//! [`Octree::build_tree`] it moves into a child only when exactly one of the
//! eight octants contains all three of its vertices.

use crate::config::OctreeSettings;
use crate::errors::CsgError;
use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use crate::float_types::{EPSILON, Real};
use crate::geometry::aabb::{AabbExt, aabb_from_points};
use crate::mesh::polygon::{Polygon, PolygonId};
use crate::mesh::vertex::Vertex;
use hashbrown::HashMap;
use nalgebra::{Matrix4, Point3, Vector3};

pub mod codec;
pub mod dedupe;
pub mod node;
pub mod query;

pub use codec::{VertexLayout, VertexLayouts};
pub use dedupe::TriangleSet;
pub use node::{NodeIndex, OctreeNode, ROOT};
pub use query::RayHit;

/// Octree of triangles making up one solid.
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    polygons: HashMap<PolygonId, Polygon>,
    owners: HashMap<PolygonId, NodeIndex>,
    /// Running bounds of everything added, the root box once built.
    bounds: Option<Aabb>,
    settings: OctreeSettings,
    built: bool,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new()
    }
}

impl Octree {
    /// Empty octree with default subdivision limits.
    pub fn new() -> Self {
        Self::with_settings(OctreeSettings::default())
    }

    pub fn with_settings(settings: OctreeSettings) -> Self {
        Octree {
            nodes: vec![OctreeNode::new(None, 0)],
            polygons: HashMap::new(),
            owners: HashMap::new(),
            bounds: None,
            settings,
            built: false,
        }
    }

    /// Built octree holding `polygons`, all marked as original input.
    pub fn from_polygons<I>(polygons: I, settings: OctreeSettings) -> Self
    where
        I: IntoIterator<Item = Polygon>,
    {
        let mut octree = Self::with_settings(settings);
        for polygon in polygons {
            octree.add_polygon(polygon, None);
        }
        octree.mark_polygons_as_original();
        octree.build_tree();
        octree
    }

    /// Built octree from flat triangle buffers: 9 position floats per
    /// triangle and, when non-empty, a normal array of the same length.
    ///
    /// Missing normals are taken from each triangle's plane.
    pub fn from_buffers(
        positions: &[f32],
        normals: &[f32],
        settings: OctreeSettings,
    ) -> Result<Self, CsgError> {
        if positions.len() % 9 != 0 {
            return Err(CsgError::VertexArrayLength(positions.len()));
        }
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(CsgError::NormalArrayLength {
                vertices: positions.len(),
                normals: normals.len(),
            });
        }

        let point = |i: usize| {
            Point3::new(
                Real::from(positions[i]),
                Real::from(positions[i + 1]),
                Real::from(positions[i + 2]),
            )
        };
        let polygons = (0..positions.len()).step_by(9).map(|base| {
            let [a, b, c] = [point(base), point(base + 3), point(base + 6)];
            if normals.is_empty() {
                return Polygon::from_points(a, b, c, 0);
            }
            let normal = |i: usize| {
                Vector3::new(
                    Real::from(normals[i]),
                    Real::from(normals[i + 1]),
                    Real::from(normals[i + 2]),
                )
            };
            Polygon::new(
                [
                    Vertex::new(a, normal(base)),
                    Vertex::new(b, normal(base + 3)),
                    Vertex::new(c, normal(base + 6)),
                ],
                0,
            )
        });
        Ok(Self::from_polygons(polygons, settings))
    }

    /// Flat position and normal buffers of every valid polygon, 9 floats per triangle.
    pub fn to_buffers(&self) -> (Vec<f32>, Vec<f32>) {
        let polygons = self.polygons();
        let mut positions = Vec::with_capacity(polygons.len() * 9);
        let mut normals = Vec::with_capacity(polygons.len() * 9);
        for polygon in polygons {
            for v in polygon.vertices() {
                positions.extend(v.pos.iter().map(|c| *c as f32));
                normals.extend(v.normal.iter().map(|c| *c as f32));
            }
        }
        (positions, normals)
    }

    pub const fn settings(&self) -> &OctreeSettings {
        &self.settings
    }

    /// The tree structure reflects every added polygon.
    pub const fn is_built(&self) -> bool {
        self.built
    }

    /// Root box, `None` before the first build or when the octree is empty.
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.nodes[ROOT].bbox
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&OctreeNode> {
        self.nodes.get(index)
    }

    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.get(&id)
    }

    pub(crate) fn polygon_mut(&mut self, id: PolygonId) -> Option<&mut Polygon> {
        self.polygons.get_mut(&id)
    }

    /// Ids in the polygon list of `node`, in list order.
    pub(crate) fn node_polygon_ids(&self, node: NodeIndex) -> Vec<PolygonId> {
        self.nodes
            .get(node)
            .map(|n| n.polygons.clone())
            .unwrap_or_default()
    }

    /// Valid polygons in arena order.
    pub fn polygons(&self) -> Vec<&Polygon> {
        self.live_polygons().filter(|p| p.valid).collect()
    }

    pub fn polygon_count(&self) -> usize {
        self.live_polygons().filter(|p| p.valid).count()
    }

    pub fn is_empty(&self) -> bool {
        self.polygon_count() == 0
    }

    /// Corner positions of every valid polygon.
    pub fn triangles(&self) -> Vec<[Point3<Real>; 3]> {
        self.live_polygons()
            .filter(|p| p.valid)
            .map(|p| p.triangle().points())
            .collect()
    }

    /// Polygons referenced by node lists (replaced polygons excluded).
    fn live_polygons(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.nodes
            .iter()
            .flat_map(|node| node.polygons.iter())
            .filter_map(|id| self.polygons.get(id))
    }

    /// Add a polygon to the root list and grow the running bounds.
    ///
    /// With a `dedupe` set, a polygon whose triangle is already in the set is
    /// dropped and `false` is returned. Adding to a built octree leaves it
    /// unbuilt until the next [`Octree::build_tree`].
    pub fn add_polygon(&mut self, polygon: Polygon, dedupe: Option<&mut TriangleSet>) -> bool {
        if let Some(seen) = dedupe {
            if !seen.insert(polygon.triangle()) {
                return false;
            }
        }

        let aabb = polygon.triangle().aabb();
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.merged(&aabb),
            None => aabb,
        });
        if let Some(root) = self.nodes[ROOT].bbox.as_mut() {
            root.merge(&aabb);
        }

        let id = polygon.id();
        self.nodes[ROOT].polygons.push(id);
        self.owners.insert(id, ROOT);
        self.polygons.insert(id, polygon);
        self.built = false;
        true
    }

    /// (Re)build the node hierarchy.
    ///
    /// All polygons are gathered at a root sized to their tight bounds, nodes
    /// holding more than `polygons_per_tree` polygons are split until
    /// `max_level`, then every box is recomputed bottom-up.
    pub fn build_tree(&mut self) -> &mut Self {
        let mut root = OctreeNode::new(None, 0);
        for node in self.nodes.drain(..) {
            root.polygons.extend(node.polygons);
            root.replaced.extend(node.replaced);
        }
        for id in root.polygons.iter().chain(&root.replaced) {
            self.owners.insert(*id, ROOT);
        }

        let polygons = &self.polygons;
        self.bounds = aabb_from_points(
            root.polygons
                .iter()
                .filter_map(|id| polygons.get(id))
                .flat_map(|p| p.triangle().points()),
        );
        root.bbox = self.bounds;
        self.nodes.push(root);

        self.split(ROOT);
        self.process_tree();
        self.built = true;
        self
    }

    /// Build unless already built.
    pub fn ensure_built(&mut self) -> &mut Self {
        if !self.built {
            self.build_tree();
        }
        self
    }

    fn split(&mut self, start: NodeIndex) {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.polygons.len() <= self.settings.polygons_per_tree
                || node.level >= self.settings.max_level
            {
                continue;
            }
            let Some(bbox) = node.bbox else {
                continue;
            };
            let level = node.level + 1;

            let half = bbox.half_extents();
            let octants: [Aabb; 8] = std::array::from_fn(|i| {
                let offset = Vector3::new(
                    if i & 1 != 0 { half.x } else { 0.0 },
                    if i & 2 != 0 { half.y } else { 0.0 },
                    if i & 4 != 0 { half.z } else { 0.0 },
                );
                let mins = bbox.mins + offset;
                Aabb::new(mins, mins + half).padded(EPSILON)
            });

            let mut kept = Vec::new();
            let mut moved: [Vec<PolygonId>; 8] = Default::default();
            for id in std::mem::take(&mut self.nodes[index].polygons) {
                let Some(polygon) = self.polygons.get(&id) else {
                    continue;
                };
                let mut containing = octants
                    .iter()
                    .enumerate()
                    .filter(|(_, octant)| octant.contains_triangle(polygon.triangle()));
                match (containing.next(), containing.next()) {
                    (Some((octant, _)), None) => moved[octant].push(id),
                    _ => kept.push(id),
                }
            }
            log::trace!(
                "splitting node {index} at level {}: {} polygons stay, {} move down",
                level - 1,
                kept.len(),
                moved.iter().map(Vec::len).sum::<usize>()
            );
            self.nodes[index].polygons = kept;

            let first_child = self.nodes.len();
            for (octant, ids) in moved.into_iter().enumerate() {
                let child_index = first_child + octant;
                for id in &ids {
                    self.owners.insert(*id, child_index);
                }
                let mut child = OctreeNode::new(Some(index), level);
                child.bbox = Some(octants[octant]);
                child.polygons = ids;
                self.nodes.push(child);
            }
            let children: [NodeIndex; 8] = std::array::from_fn(|i| first_child + i);
            self.nodes[index].children = Some(children);
            stack.extend(children);
        }
    }

    /// Recompute every node box bottom-up from its own polygons and its
    /// children's boxes; empty subtrees end up without a box.
    fn process_tree(&mut self) {
        // children are always stored after their parent
        for index in (0..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            let polygons = &self.polygons;
            let mut bbox = aabb_from_points(
                node.polygons
                    .iter()
                    .filter_map(|id| polygons.get(id))
                    .flat_map(|p| p.triangle().points()),
            );
            if let Some(children) = node.children {
                for child in children {
                    if let Some(child_box) = self.nodes[child].bbox {
                        bbox = Some(match bbox {
                            Some(b) => b.merged(&child_box),
                            None => child_box,
                        });
                    }
                }
            }
            self.nodes[index].bbox = bbox;
        }
    }

    /// Flip every valid polygon, turning the solid inside out.
    pub fn invert(&mut self) {
        let polygons = &mut self.polygons;
        for id in self.nodes.iter().flat_map(|node| node.polygons.iter()) {
            if let Some(polygon) = polygons.get_mut(id) {
                if polygon.valid {
                    polygon.flip();
                }
            }
        }
    }

    /// Transform every polygon by `matrix`, normals by its inverse transpose,
    /// and rebuild the tree if it was built.
    pub fn apply_matrix(&mut self, matrix: &Matrix4<Real>) -> Result<&mut Self, CsgError> {
        let normal_matrix = matrix
            .try_inverse()
            .ok_or(CsgError::NonInvertibleMatrix)?
            .transpose();
        for polygon in self.polygons.values_mut() {
            polygon.transform(matrix, &normal_matrix);
        }
        if self.built {
            self.build_tree();
        } else {
            let polygons = &self.polygons;
            self.bounds = aabb_from_points(polygons.values().flat_map(|p| p.triangle().points()));
            if self.nodes[ROOT].bbox.is_some() {
                self.nodes[ROOT].bbox = self.bounds;
            }
        }
        Ok(self)
    }

    /// Drop every polygon and node.
    pub fn delete(&mut self) {
        *self = Self::with_settings(self.settings);
    }

    /// Substitute `fragments` for polygon `old` at the same position in its node's list.
    ///
    /// An original polygon is kept in the node's replaced list, still valid
    /// for queries by the other operand; any other polygon is discarded.
    pub fn replace_polygon(&mut self, old: PolygonId, fragments: Vec<Polygon>) {
        let Some(&owner) = self.owners.get(&old) else {
            return;
        };
        let node = &mut self.nodes[owner];
        let Some(position) = node.polygons.iter().position(|id| *id == old) else {
            return;
        };
        node.polygons
            .splice(position..=position, fragments.iter().map(Polygon::id));
        for fragment in fragments {
            self.owners.insert(fragment.id(), owner);
            self.polygons.insert(fragment.id(), fragment);
        }

        let keep = self.polygons.get(&old).is_some_and(|p| p.original_valid);
        if keep {
            self.nodes[owner].replaced.push(old);
        } else {
            self.polygons.remove(&old);
            self.owners.remove(&old);
        }
    }

    /// Reset the classification of every polygon.
    pub fn reset_polygons(&mut self, reset_original: bool) {
        for polygon in self.polygons.values_mut() {
            polygon.reset(reset_original);
        }
    }

    /// Flag polygons whose triangle overlaps `target`.
    pub fn mark_intersecting_polygons(&mut self, target: &Aabb) {
        for polygon in self.polygons.values_mut() {
            polygon.intersects = target.intersects_triangle(polygon.triangle());
        }
    }

    /// Flag every polygon as input surface for the next operation.
    pub fn mark_polygons_as_original(&mut self) {
        for polygon in self.polygons.values_mut() {
            polygon.mark_original();
        }
    }

    /// Free the originals stashed by [`Octree::replace_polygon`].
    pub fn delete_replaced_polygons(&mut self) {
        for node in &mut self.nodes {
            for id in node.replaced.drain(..) {
                self.polygons.remove(&id);
                self.owners.remove(&id);
            }
        }
    }

    /// Free valid polygons whose `intersects` flag equals `intersects`.
    pub fn delete_polygons_by_intersection(&mut self, intersects: bool) -> usize {
        self.delete_polygons_where(|p| p.valid && p.intersects == intersects)
    }

    /// Free every listed polygon matching `doomed`; returns how many went.
    pub fn delete_polygons_where<F>(&mut self, doomed: F) -> usize
    where
        F: Fn(&Polygon) -> bool,
    {
        let polygons = &mut self.polygons;
        let owners = &mut self.owners;
        let mut removed = 0;
        for node in &mut self.nodes {
            node.polygons.retain(|id| {
                if !polygons.get(id).is_some_and(&doomed) {
                    return true;
                }
                polygons.remove(id);
                owners.remove(id);
                removed += 1;
                false
            });
        }
        removed
    }

    /// Take every valid polygon out, in arena order.
    pub(crate) fn into_valid_polygons(mut self) -> Vec<Polygon> {
        let ids: Vec<PolygonId> = self
            .nodes
            .iter()
            .flat_map(|node| node.polygons.iter().copied())
            .collect();
        ids.into_iter()
            .filter_map(|id| self.polygons.remove(&id))
            .filter(|p| p.valid)
            .collect()
    }
}
