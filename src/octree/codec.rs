//! Little-endian binary encoding of an octree.
//!
//! ```text
//! Octree  := u32 sectionCount | u8 flags | [box] | section* | [8 × Octree]
//! flags   := bit0 hasBox | bit1 hasSubtrees | bit2 needsRebuild
//! box     := f32[3] min | f32[3] max
//! section := u32 material | u32 polygonCount | polygonCount × 3 × vertex
//! vertex  := f32[3] position | [f32[3] normal] | attribute components
//! ```
//!
//! What follows the position of a vertex is fixed per material by a
//! [`VertexLayout`]. Only valid polygons are written. An octree that was
//! never built is written as a single box-less node flagged `needsRebuild`,
//! and decoding rebuilds it.

use super::Octree;
use super::node::{NodeIndex, OctreeNode, ROOT};
use crate::config::OctreeSettings;
use crate::errors::{CsgError, DecodeError};
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::{AttributeKind, Vertex};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

const HAS_BOX: u8 = 1;
const HAS_SUBTREES: u8 = 1 << 1;
const NEEDS_REBUILD: u8 = 1 << 2;
const KNOWN_FLAGS: u8 = HAS_BOX | HAS_SUBTREES | NEEDS_REBUILD;

/// Deepest nesting accepted from untrusted input.
const MAX_DECODE_DEPTH: usize = 64;

/// Per-vertex data written after the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub normal: bool,
    pub attributes: Vec<AttributeKind>,
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self {
            normal: true,
            attributes: Vec::new(),
        }
    }
}

impl VertexLayout {
    /// Floats per vertex, position included.
    pub fn stride(&self) -> usize {
        3 + if self.normal { 3 } else { 0 } + self.attributes.iter().map(|k| k.len()).sum::<usize>()
    }
}

/// Vertex layouts by material, with a fallback for unregistered materials.
#[derive(Debug, Clone, Default)]
pub struct VertexLayouts {
    fallback: VertexLayout,
    materials: HashMap<u32, VertexLayout>,
}

impl VertexLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: VertexLayout) -> Self {
        Self {
            fallback,
            materials: HashMap::new(),
        }
    }

    pub fn register(&mut self, material: u32, layout: VertexLayout) -> &mut Self {
        self.materials.insert(material, layout);
        self
    }

    pub fn get(&self, material: u32) -> &VertexLayout {
        self.materials.get(&material).unwrap_or(&self.fallback)
    }
}

impl Octree {
    /// Encode with the default layout (position and normal).
    pub fn encode(&self) -> Result<Vec<u8>, CsgError> {
        self.encode_with(&VertexLayouts::default())
    }

    pub fn encode_with(&self, layouts: &VertexLayouts) -> Result<Vec<u8>, CsgError> {
        let mut out = Vec::new();
        if self.built || self.polygons.is_empty() {
            self.encode_node(ROOT, layouts, &mut out)?;
        } else {
            write_node(&mut out, &self.polygons(), NEEDS_REBUILD, None, layouts)?;
        }
        Ok(out)
    }

    fn encode_node(&self, index: NodeIndex, layouts: &VertexLayouts, out: &mut Vec<u8>) -> Result<(), CsgError> {
        let node = &self.nodes[index];
        let polygons: Vec<&Polygon> = node
            .polygons
            .iter()
            .filter_map(|id| self.polygons.get(id))
            .filter(|p| p.valid)
            .collect();

        let mut flags = 0;
        if node.bbox.is_some() {
            flags |= HAS_BOX;
        }
        if node.children.is_some() {
            flags |= HAS_SUBTREES;
        }
        write_node(out, &polygons, flags, node.bbox.as_ref(), layouts)?;

        if let Some(children) = node.children {
            for child in children {
                self.encode_node(child, layouts, out)?;
            }
        }
        Ok(())
    }

    /// Decode with the default layout and subdivision settings.
    pub fn decode(bytes: &[u8]) -> Result<Self, CsgError> {
        Self::decode_with(bytes, &VertexLayouts::default(), OctreeSettings::default())
    }

    /// Decode an encoded octree; every polygon comes back marked as original input.
    pub fn decode_with(
        bytes: &[u8],
        layouts: &VertexLayouts,
        settings: OctreeSettings,
    ) -> Result<Self, CsgError> {
        let mut reader = Reader::new(bytes);
        let mut octree = Octree::with_settings(settings);
        octree.nodes.clear();

        let (_, needs_rebuild) = decode_node(&mut reader, &mut octree, None, 0, layouts)?;
        if reader.remaining() > 0 {
            return Err(DecodeError::TrailingBytes(reader.remaining()).into());
        }

        octree.mark_polygons_as_original();
        octree.bounds = octree.nodes[ROOT].bbox;
        if needs_rebuild || (octree.bounds.is_none() && !octree.polygons.is_empty()) {
            octree.build_tree();
        } else {
            octree.built = true;
        }
        Ok(octree)
    }
}

fn write_node(
    out: &mut Vec<u8>,
    polygons: &[&Polygon],
    flags: u8,
    bbox: Option<&Aabb>,
    layouts: &VertexLayouts,
) -> Result<(), CsgError> {
    let sections = group_by_material(polygons);
    out.extend_from_slice(&(sections.len() as u32).to_le_bytes());
    out.push(flags);
    if let Some(bbox) = bbox {
        for c in bbox.mins.iter().chain(bbox.maxs.iter()) {
            out.extend_from_slice(&(*c as f32).to_le_bytes());
        }
    }

    for (material, group) in sections {
        let layout = layouts.get(material);
        out.extend_from_slice(&material.to_le_bytes());
        out.extend_from_slice(&(group.len() as u32).to_le_bytes());
        for polygon in group {
            for vertex in polygon.vertices() {
                write_vertex(out, vertex, layout, material)?;
            }
        }
    }
    Ok(())
}

fn write_vertex(out: &mut Vec<u8>, vertex: &Vertex, layout: &VertexLayout, material: u32) -> Result<(), CsgError> {
    let kinds_match = vertex.attributes.len() == layout.attributes.len()
        && vertex
            .attributes
            .iter()
            .zip(&layout.attributes)
            .all(|(a, k)| a.kind() == *k);
    if !kinds_match {
        return Err(CsgError::AttributeLayout { material });
    }

    let mut put = |c: Real| out.extend_from_slice(&(c as f32).to_le_bytes());
    vertex.pos.iter().for_each(|c| put(*c));
    if layout.normal {
        vertex.normal.iter().for_each(|c| put(*c));
    }
    for attribute in &vertex.attributes {
        attribute.components().iter().for_each(|c| put(*c));
    }
    Ok(())
}

/// Polygons grouped by material, groups in order of first appearance.
fn group_by_material<'a>(polygons: &[&'a Polygon]) -> Vec<(u32, Vec<&'a Polygon>)> {
    let mut groups: Vec<(u32, Vec<&Polygon>)> = Vec::new();
    for &polygon in polygons {
        match groups.iter_mut().find(|(m, _)| *m == polygon.material) {
            Some((_, group)) => group.push(polygon),
            None => groups.push((polygon.material, vec![polygon])),
        }
    }
    groups
}

fn decode_node(
    reader: &mut Reader<'_>,
    octree: &mut Octree,
    parent: Option<NodeIndex>,
    level: usize,
    layouts: &VertexLayouts,
) -> Result<(NodeIndex, bool), CsgError> {
    if level > MAX_DECODE_DEPTH {
        return Err(DecodeError::TooDeep(MAX_DECODE_DEPTH).into());
    }
    let index = octree.nodes.len();
    octree.nodes.push(OctreeNode::new(parent, level));

    let section_count = reader.u32()?;
    let flags = reader.u8()?;
    if flags & !KNOWN_FLAGS != 0 {
        return Err(DecodeError::InvalidFlags(flags).into());
    }
    if flags & HAS_SUBTREES != 0 && flags & HAS_BOX == 0 {
        return Err(DecodeError::SubtreesWithoutBox.into());
    }

    if flags & HAS_BOX != 0 {
        let mins = reader.point()?;
        let maxs = reader.point()?;
        octree.nodes[index].bbox = Some(Aabb::new(mins, maxs));
    }

    for _ in 0..section_count {
        let material = reader.u32()?;
        let count = reader.u32()? as usize;
        let layout = layouts.get(material);
        // validate the whole section up front so a bogus count cannot allocate
        let section_bytes = count.saturating_mul(3 * layout.stride() * 4);
        reader.ensure(section_bytes)?;

        for _ in 0..count {
            let mut vertices = [
                reader.vertex(layout)?,
                reader.vertex(layout)?,
                reader.vertex(layout)?,
            ];
            if !layout.normal {
                use_face_normal(&mut vertices);
            }
            let polygon = Polygon::new(vertices, material);
            let id = polygon.id();
            octree.nodes[index].polygons.push(id);
            octree.owners.insert(id, index);
            octree.polygons.insert(id, polygon);
        }
    }

    let mut needs_rebuild = flags & NEEDS_REBUILD != 0;
    if flags & HAS_SUBTREES != 0 {
        let mut children = [0; 8];
        for child in &mut children {
            let (child_index, child_rebuild) = decode_node(reader, octree, Some(index), level + 1, layouts)?;
            *child = child_index;
            needs_rebuild |= child_rebuild;
        }
        octree.nodes[index].children = Some(children);
    }
    Ok((index, needs_rebuild))
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    const fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn ensure(&self, needed: usize) -> Result<(), DecodeError> {
        if needed > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        self.ensure(N)?;
        let mut buf = [0; N];
        buf.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        Ok(buf)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn real(&mut self) -> Result<Real, DecodeError> {
        Ok(Real::from(f32::from_le_bytes(self.take()?)))
    }

    fn point(&mut self) -> Result<Point3<Real>, DecodeError> {
        Ok(Point3::new(self.real()?, self.real()?, self.real()?))
    }

    fn vertex(&mut self, layout: &VertexLayout) -> Result<Vertex, DecodeError> {
        let pos = self.point()?;
        let normal = if layout.normal {
            Vector3::new(self.real()?, self.real()?, self.real()?)
        } else {
            Vector3::zeros()
        };
        let mut attributes = Vec::with_capacity(layout.attributes.len());
        for kind in &layout.attributes {
            let mut components = [0.0; 4];
            for c in components.iter_mut().take(kind.len()) {
                *c = self.real()?;
            }
            if let Some(attribute) = kind.from_components(&components[..kind.len()]) {
                attributes.push(attribute);
            }
        }
        Ok(Vertex::new(pos, normal).with_attributes(attributes))
    }
}

fn use_face_normal(vertices: &mut [Vertex; 3]) {
    let normal = Plane::from_points(&vertices[0].pos, &vertices[1].pos, &vertices[2].pos).normal;
    for v in vertices.iter_mut() {
        v.normal = normal;
    }
}
