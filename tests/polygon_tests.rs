use nalgebra::{Point3, Vector3};
use octree_csg::{
    PolygonState,
    float_types::{EPSILON, Real},
    mesh::{Plane, Polygon, PolygonSplit, SplitKind, Vertex},
};

mod support;

use crate::support::{approx_eq, make_triangle, make_triangle_with_normal};

fn right_triangle() -> Polygon {
    make_triangle([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]])
}

#[test]
fn construction_derives_plane_and_triangle() {
    let poly = make_triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [1.0, 0.0, -1.0]]);
    assert!(approx_eq(poly.plane().normal.dot(&Vector3::y()).abs(), 1.0, 1e-12));
    assert_eq!(poly.triangle().points()[1], Point3::new(1.0, 0.0, 1.0));
    assert!(approx_eq(poly.triangle().area(), 1.0, 1e-12));

    assert_eq!(poly.state(), PolygonState::Undecided);
    assert!(poly.valid);
    assert!(!poly.original_valid);
    assert!(!poly.intersects && !poly.coplanar && !poly.new_polygon);
}

#[test]
fn ids_are_unique_and_increasing() {
    let first = right_triangle();
    let second = right_triangle();
    assert!(second.id() > first.id());

    let copy = first.duplicate();
    assert_ne!(copy.id(), first.id());
    assert_eq!(copy.triangle(), first.triangle());
}

#[test]
fn duplicate_carries_classification() {
    let mut poly = right_triangle();
    poly.set_state(PolygonState::Inside);
    poly.mark_original();
    let copy = poly.duplicate();
    assert_eq!(copy.state(), PolygonState::Inside);
    assert!(copy.original_valid);
}

#[test]
fn state_history_records_decided_states() {
    let mut poly = right_triangle();

    poly.set_state(PolygonState::Inside);
    assert_eq!(poly.previous_state(), PolygonState::Undecided);
    assert!(poly.previous_states().is_empty());
    assert!(poly.check_all_states(PolygonState::Inside));

    poly.set_state(PolygonState::Inside);
    assert_eq!(poly.previous_states(), &[PolygonState::Inside]);
    assert!(poly.check_all_states(PolygonState::Inside));

    poly.set_state(PolygonState::Outside);
    assert_eq!(poly.previous_state(), PolygonState::Inside);
    assert_eq!(
        poly.previous_states(),
        &[PolygonState::Inside, PolygonState::Inside]
    );
    assert!(!poly.check_all_states(PolygonState::Outside));
    assert!(!poly.check_all_states(PolygonState::Inside));
}

#[test]
fn reset_clears_the_operation_but_not_originality() {
    let mut poly = right_triangle();
    poly.mark_original();
    poly.set_state(PolygonState::CoplanarFront);
    poly.set_state(PolygonState::Outside);
    poly.intersects = true;
    poly.coplanar = true;
    poly.valid = false;
    poly.new_polygon = true;

    poly.reset(false);
    assert_eq!(poly.state(), PolygonState::Undecided);
    assert_eq!(poly.previous_state(), PolygonState::Undecided);
    assert!(poly.previous_states().is_empty());
    assert!(poly.valid);
    assert!(!poly.intersects && !poly.coplanar && !poly.new_polygon);
    assert!(poly.original_valid);

    poly.reset(true);
    assert!(!poly.original_valid);
}

#[test]
fn flip_reverses_winding_and_normals() {
    let mut poly = make_triangle_with_normal(
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        Vector3::z(),
    );
    poly.flip();

    let positions: Vec<Point3<Real>> = poly.vertices().iter().map(|v| v.pos).collect();
    assert_eq!(
        positions,
        vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]
    );
    assert!(poly.vertices().iter().all(|v| v.normal == -Vector3::z()));
    assert!(approx_eq(poly.plane().normal.z, -1.0, 1e-12));
    assert!(approx_eq(poly.triangle().scaled_normal().z, -1.0, 1e-12));
}

#[test]
fn degenerate_triangle_falls_back_to_z_plane() {
    let plane = Plane::from_points(
        &Point3::new(0.0, 0.0, 0.0),
        &Point3::new(1.0, 1.0, 1.0),
        &Point3::new(2.0, 2.0, 2.0),
    );
    assert_eq!(plane.normal, Vector3::z());
    assert_eq!(plane.w, 0.0);
}

#[test]
fn split_cuts_a_spanning_triangle() {
    let poly = right_triangle();
    let plane = Plane::from_normal(Vector3::x(), 1.0);

    let PolygonSplit::Fragments(fragments) = plane.split_polygon(&poly) else {
        panic!("triangle spans x = 1");
    };
    assert_eq!(fragments.len(), 3);

    let area = |kind: SplitKind| -> Real {
        fragments
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(p, _)| p.triangle().area())
            .sum()
    };
    assert!(approx_eq(area(SplitKind::Front), 0.5, 1e-12));
    assert!(approx_eq(area(SplitKind::Back), 1.5, 1e-12));

    for (fragment, kind) in &fragments {
        assert_ne!(fragment.id(), poly.id());
        assert_eq!(fragment.material, poly.material);
        assert!(approx_eq(fragment.plane().normal.z, 1.0, 1e-12));
        for vertex in fragment.vertices() {
            let side = plane.signed_distance(&vertex.pos);
            match kind {
                SplitKind::Front => assert!(side >= -EPSILON),
                SplitKind::Back => assert!(side <= EPSILON),
                other => panic!("unexpected fragment kind {other:?}"),
            }
        }
    }
}

#[test]
fn split_interpolates_attributes() {
    use octree_csg::mesh::Attribute;

    let vertex = |x: Real, z: Real, s: Real| {
        Vertex::new(Point3::new(x, 0.0, z), Vector3::y()).with_attributes(vec![Attribute::Scalar(s)])
    };
    let poly = Polygon::new(
        [vertex(0.0, 1.0, 0.0), vertex(2.0, 0.0, 2.0), vertex(0.0, -1.0, 0.0)],
        3,
    );
    let plane = Plane::from_normal(Vector3::x(), 1.0);
    let PolygonSplit::Fragments(fragments) = plane.split_polygon(&poly) else {
        panic!("triangle spans x = 1");
    };
    let on_plane: Vec<&Vertex> = fragments
        .iter()
        .flat_map(|(p, _)| p.vertices().iter())
        .filter(|v| approx_eq(v.pos.x, 1.0, 1e-12))
        .collect();
    assert!(!on_plane.is_empty());
    // both cut edges run from an x = 0 vertex (s = 0) to the x = 2 vertex (s = 2)
    for v in on_plane {
        assert_eq!(v.attributes, vec![Attribute::Scalar(1.0)]);
    }
    assert!(fragments.iter().all(|(p, _)| p.material == 3));
}

#[test]
fn whole_polygons_keep_their_side() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);

    let above = make_triangle([[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
    assert!(matches!(plane.split_polygon(&above), PolygonSplit::Whole(SplitKind::Front)));

    let below = make_triangle([[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -2.0]]);
    assert!(matches!(plane.split_polygon(&below), PolygonSplit::Whole(SplitKind::Back)));

    // touching the plane at one vertex does not split
    let touching = make_triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
    assert!(matches!(plane.split_polygon(&touching), PolygonSplit::Whole(SplitKind::Front)));
}

#[test]
fn coplanar_polygons_report_their_facing() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);

    let mut poly = make_triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let PolygonSplit::Whole(kind) = plane.split_polygon(&poly) else {
        panic!("coplanar polygon was split");
    };
    assert_eq!(kind, SplitKind::CoplanarFront);
    assert_eq!(kind.coplanar_state(), Some(PolygonState::CoplanarFront));

    poly.flip();
    let PolygonSplit::Whole(kind) = plane.split_polygon(&poly) else {
        panic!("coplanar polygon was split");
    };
    assert_eq!(kind, SplitKind::CoplanarBack);
    assert_eq!(kind.coplanar_state(), Some(PolygonState::CoplanarBack));

    assert_eq!(SplitKind::Front.coplanar_state(), None);
}

#[test]
fn vertices_within_epsilon_count_as_coplanar() {
    let plane = Plane::from_normal(Vector3::z(), 0.0);
    let d = EPSILON / 2.0;
    let poly = make_triangle([[0.0, 0.0, d], [1.0, 0.0, -d], [0.0, 1.0, 0.0]]);
    assert!(matches!(
        plane.split_polygon(&poly),
        PolygonSplit::Whole(SplitKind::CoplanarFront)
    ));
}

#[test]
fn transform_keeps_plane_in_sync() {
    let mut poly = right_triangle();
    let matrix = nalgebra::Matrix4::new_translation(&Vector3::new(0.0, 0.0, 3.0));
    poly.transform(&matrix, &nalgebra::Matrix4::identity());

    assert!(approx_eq(poly.plane().w, 3.0, 1e-12));
    assert!(approx_eq(poly.midpoint().z, 3.0, 1e-12));
    assert!(poly.vertices().iter().all(|v| v.pos.z == 3.0));
}
