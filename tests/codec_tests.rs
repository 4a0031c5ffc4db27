mod support;

use nalgebra::{Point3, Vector2};
use octree_csg::{
    CsgError, DecodeError, Octree, OctreeSettings,
    mesh::{Attribute, AttributeKind, Polygon, Vertex},
    octree::{VertexLayout, VertexLayouts},
};

use crate::support::{approx_eq, make_triangle, translated};

fn sorted_corners(octree: &Octree) -> Vec<[f32; 9]> {
    let mut corners: Vec<[f32; 9]> = octree
        .triangles()
        .iter()
        .map(|t| {
            let mut flat = [0.0; 9];
            for (i, p) in t.iter().enumerate() {
                for axis in 0..3 {
                    flat[i * 3 + axis] = p[axis] as f32;
                }
            }
            flat
        })
        .collect();
    corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
    corners
}

#[test]
fn round_trip_keeps_geometry_and_materials() {
    let mut polygons: Vec<Polygon> = Octree::sphere(1.0, 24, 12)
        .polygons()
        .into_iter()
        .cloned()
        .collect();
    for (i, polygon) in polygons.iter_mut().enumerate() {
        polygon.material = (i % 3) as u32;
    }
    let settings = OctreeSettings {
        polygons_per_tree: 16,
        max_level: 8,
    };
    let octree = Octree::from_polygons(polygons, settings);
    assert!(octree.node_count() > 1);

    let bytes = octree.encode().unwrap();
    let decoded = Octree::decode_with(&bytes, &VertexLayouts::default(), settings).unwrap();

    assert!(decoded.is_built());
    assert_eq!(decoded.polygon_count(), octree.polygon_count());
    assert_eq!(decoded.node_count(), octree.node_count());
    assert_eq!(sorted_corners(&decoded), sorted_corners(&octree));

    let mut materials: Vec<u32> = decoded.polygons().iter().map(|p| p.material).collect();
    let mut expected: Vec<u32> = octree.polygons().iter().map(|p| p.material).collect();
    materials.sort_unstable();
    expected.sort_unstable();
    assert_eq!(materials, expected);

    assert!(decoded.polygons().iter().all(|p| p.original_valid));
}

#[test]
fn unbuilt_octree_is_rebuilt_on_decode() {
    let mut octree = Octree::new();
    octree.add_polygon(make_triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]), None);
    octree.add_polygon(make_triangle([[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]), None);
    assert!(!octree.is_built());

    let decoded = Octree::decode(&octree.encode().unwrap()).unwrap();
    assert!(decoded.is_built());
    assert_eq!(decoded.polygon_count(), 2);
    let bbox = decoded.bounding_box().unwrap();
    assert!(approx_eq(bbox.maxs.z, 1.0, 1e-9));
}

#[test]
fn empty_octree_round_trips() {
    let bytes = Octree::new().encode().unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 0, 0]);
    let decoded = Octree::decode(&bytes).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn header_layout_is_little_endian() {
    let bytes = Octree::cube(1.0).encode().unwrap();
    // one material section, flags = hasBox
    assert_eq!(&bytes[..5], &[1, 0, 0, 0, 1]);
    // box min x, then (after the box) the material id and polygon count
    assert_eq!(f32::from_le_bytes(bytes[5..9].try_into().unwrap()), 0.0);
    assert_eq!(f32::from_le_bytes(bytes[17..21].try_into().unwrap()), 1.0);
    assert_eq!(u32::from_le_bytes(bytes[29..33].try_into().unwrap()), 0);
    assert_eq!(u32::from_le_bytes(bytes[33..37].try_into().unwrap()), 12);
    // 12 triangles x 3 vertices x (position + normal) floats
    assert_eq!(bytes.len(), 37 + 12 * 3 * 6 * 4);
}

#[test]
fn per_material_layouts_carry_attributes() {
    let uv = |u: f64, v: f64| vec![Attribute::Vec2(Vector2::new(u, v))];
    let textured = Polygon::new(
        [
            Vertex::new(Point3::new(0.0, 0.0, 0.0), nalgebra::Vector3::z()).with_attributes(uv(0.0, 0.0)),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), nalgebra::Vector3::z()).with_attributes(uv(1.0, 0.0)),
            Vertex::new(Point3::new(0.0, 1.0, 0.0), nalgebra::Vector3::z()).with_attributes(uv(0.0, 1.0)),
        ],
        5,
    );
    let plain = make_triangle([[0.0, 0.0, 2.0], [1.0, 0.0, 2.0], [0.0, 1.0, 2.0]]);
    let octree = Octree::from_polygons([textured, plain], OctreeSettings::default());

    let mut layouts = VertexLayouts::new();
    layouts.register(
        5,
        VertexLayout {
            normal: false,
            attributes: vec![AttributeKind::Vec2],
        },
    );
    let bytes = octree.encode_with(&layouts).unwrap();
    let decoded = Octree::decode_with(&bytes, &layouts, OctreeSettings::default()).unwrap();

    let textured = decoded
        .polygons()
        .into_iter()
        .find(|p| p.material == 5)
        .expect("textured polygon survives");
    let uvs: Vec<Attribute> = textured
        .vertices()
        .iter()
        .flat_map(|v| v.attributes.clone())
        .collect();
    assert_eq!(uvs, [uv(0.0, 0.0), uv(1.0, 0.0), uv(0.0, 1.0)].concat());
    // normals were not stored for material 5, the face normal stands in
    assert!(textured.vertices().iter().all(|v| approx_eq(v.normal.z, 1.0, 1e-9)));
}

#[test]
fn layout_mismatch_is_rejected_on_encode() {
    let vertex = |x: f64, y: f64| {
        Vertex::new(Point3::new(x, y, 0.0), nalgebra::Vector3::z()).with_attributes(vec![Attribute::Scalar(1.0)])
    };
    let octree = Octree::from_polygons(
        [Polygon::new([vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)], 2)],
        OctreeSettings::default(),
    );
    assert!(matches!(octree.encode(), Err(CsgError::AttributeLayout { material: 2 })));
}

#[test]
fn truncated_input_is_rejected() {
    let bytes = translated(Octree::cube(1.0), 1.0, 2.0, 3.0).encode().unwrap();
    for cut in [0, 3, 4, 20, bytes.len() - 1] {
        assert!(
            matches!(
                Octree::decode(&bytes[..cut]),
                Err(CsgError::Decode(DecodeError::Truncated { .. }))
            ),
            "cut at {cut}"
        );
    }
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = Octree::cube(1.0).encode().unwrap();
    bytes.push(0);
    assert!(matches!(
        Octree::decode(&bytes),
        Err(CsgError::Decode(DecodeError::TrailingBytes(1)))
    ));
}

#[test]
fn malformed_headers_are_rejected() {
    assert!(matches!(
        Octree::decode(&[0, 0, 0, 0, 0x80]),
        Err(CsgError::Decode(DecodeError::InvalidFlags(0x80)))
    ));
    assert!(matches!(
        Octree::decode(&[0, 0, 0, 0, 2]),
        Err(CsgError::Decode(DecodeError::SubtreesWithoutBox))
    ));
}

#[test]
fn huge_polygon_count_fails_before_allocating() {
    let mut bytes = vec![1, 0, 0, 0, 0];
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    match Octree::decode(&bytes) {
        Err(CsgError::Decode(DecodeError::Truncated { remaining, .. })) => assert_eq!(remaining, 0),
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn nesting_depth_is_bounded() {
    // every node: no sections, hasBox | hasSubtrees, a zero box, then its first child
    let mut bytes = Vec::new();
    for _ in 0..70 {
        bytes.extend_from_slice(&[0, 0, 0, 0, 3]);
        bytes.extend_from_slice(&[0; 24]);
    }
    assert!(matches!(
        Octree::decode(&bytes),
        Err(CsgError::Decode(DecodeError::TooDeep(_)))
    ));
}
