//! Octree node data structure

use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::mesh::polygon::PolygonId;

/// Index of a node in its octree's arena.
pub type NodeIndex = usize;

/// The root always lives at index 0.
pub const ROOT: NodeIndex = 0;

/// One cell of an [`Octree`](super::Octree).
///
/// A node has either no children or eight, always stored after it in the arena.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// Tight bounds of the subtree's polygons, `None` until built or when empty.
    pub(crate) bbox: Option<Aabb>,
    /// Polygons that no single child box fully contains.
    pub(crate) polygons: Vec<PolygonId>,
    /// Original polygons split during the current operation; still valid for
    /// queries against this octree until `delete_replaced_polygons`.
    pub(crate) replaced: Vec<PolygonId>,
    pub(crate) children: Option<[NodeIndex; 8]>,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) level: usize,
}

impl OctreeNode {
    pub(crate) const fn new(parent: Option<NodeIndex>, level: usize) -> Self {
        Self {
            bbox: None,
            polygons: Vec::new(),
            replaced: Vec::new(),
            children: None,
            parent,
            level,
        }
    }

    pub const fn bbox(&self) -> Option<&Aabb> {
        self.bbox.as_ref()
    }

    pub fn polygon_ids(&self) -> &[PolygonId] {
        &self.polygons
    }

    pub fn replaced_ids(&self) -> &[PolygonId] {
        &self.replaced
    }

    pub const fn children(&self) -> Option<&[NodeIndex; 8]> {
        self.children.as_ref()
    }

    pub const fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub const fn level(&self) -> usize {
        self.level
    }

    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}
