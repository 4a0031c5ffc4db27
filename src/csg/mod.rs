//! Boolean operations between octrees.
//!
//! Both operands are consumed. When their boxes overlap, each is split along
//! the other's surface, every intersecting piece is classified inside or
//! outside the other solid, and the operation's [`RuleSet`] decides which
//! pieces survive. Disjoint operands skip all of that.

pub mod array;
pub mod classify;
pub mod dispatch;
pub mod operation;
pub mod rules;

use crate::config::CsgOptions;
use crate::errors::CsgError;
use crate::float_types::parry3d::bounding_volume::BoundingVolume;
use crate::octree::{Octree, TriangleSet};
use rules::RuleSet;

/// The three binary boolean operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

impl BooleanOp {
    pub const fn rules(self) -> RuleSet {
        match self {
            BooleanOp::Union => rules::UNION,
            BooleanOp::Subtract => rules::SUBTRACT,
            BooleanOp::Intersect => rules::INTERSECT,
        }
    }
}

impl CsgOptions {
    /// Everything inside either solid.
    pub fn union(&self, a: Octree, b: Octree) -> Result<Octree, CsgError> {
        self.boolean(BooleanOp::Union, a, b)
    }

    /// Everything inside `a` and outside `b`.
    pub fn subtract(&self, a: Octree, b: Octree) -> Result<Octree, CsgError> {
        self.boolean(BooleanOp::Subtract, a, b)
    }

    /// Everything inside both solids.
    pub fn intersect(&self, a: Octree, b: Octree) -> Result<Octree, CsgError> {
        self.boolean(BooleanOp::Intersect, a, b)
    }

    pub fn boolean(&self, op: BooleanOp, mut a: Octree, mut b: Octree) -> Result<Octree, CsgError> {
        a.ensure_built().mark_polygons_as_original();
        b.ensure_built().mark_polygons_as_original();

        let mut result = Octree::with_settings(self.octree);
        let mut seen = TriangleSet::new();

        match (a.bounding_box(), b.bounding_box()) {
            (Some(a_box), Some(b_box)) if a_box.intersects(&b_box) => {
                a.reset_polygons(false);
                b.reset_polygons(false);
                a.mark_intersecting_polygons(&b_box);
                b.mark_intersecting_polygons(&a_box);

                classify::handle_intersecting_octrees(&mut a, &mut b, self.use_winding_number)?;
                a.delete_replaced_polygons();
                b.delete_replaced_polygons();

                let rules = op.rules();
                let removed_a = a.delete_polygons_by_rules(rules.a);
                let removed_b = b.delete_polygons_by_rules(rules.b);
                log::debug!("{op:?}: rules removed {removed_a} polygons of a and {removed_b} of b");

                match op {
                    BooleanOp::Union => {},
                    BooleanOp::Subtract => {
                        b.delete_polygons_by_intersection(false);
                        b.invert();
                    },
                    BooleanOp::Intersect => {
                        a.delete_polygons_by_intersection(false);
                        b.delete_polygons_by_intersection(false);
                    },
                }
                harvest(&mut result, a, &mut seen);
                harvest(&mut result, b, &mut seen);
            },
            _ => {
                log::debug!("{op:?}: operand boxes do not overlap");
                match op {
                    BooleanOp::Union => {
                        harvest(&mut result, a, &mut seen);
                        harvest(&mut result, b, &mut seen);
                    },
                    BooleanOp::Subtract => harvest(&mut result, a, &mut seen),
                    BooleanOp::Intersect => {},
                }
            },
        }

        result.mark_polygons_as_original();
        if self.build_result {
            result.build_tree();
        }
        log::debug!("{op:?}: result holds {} polygons", result.polygon_count());
        Ok(result)
    }
}

/// Move the surviving polygons of `source` into `result`, dropping duplicate triangles.
///
/// Operands cloned from one another share polygon ids, so every polygon gets a fresh one.
fn harvest(result: &mut Octree, source: Octree, seen: &mut TriangleSet) {
    for polygon in source.into_valid_polygons() {
        let mut polygon = polygon.duplicate();
        polygon.reset(true);
        result.add_polygon(polygon, Some(seen));
    }
}

/// [`CsgOptions::union`] with default options.
pub fn union(a: Octree, b: Octree) -> Result<Octree, CsgError> {
    CsgOptions::default().union(a, b)
}

/// [`CsgOptions::subtract`] with default options.
pub fn subtract(a: Octree, b: Octree) -> Result<Octree, CsgError> {
    CsgOptions::default().subtract(a, b)
}

/// [`CsgOptions::intersect`] with default options.
pub fn intersect(a: Octree, b: Octree) -> Result<Octree, CsgError> {
    CsgOptions::default().intersect(a, b)
}
