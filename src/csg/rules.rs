//! Per-operation deletion rules.
//!
//! After classification every intersecting polygon of each operand is checked
//! against its operand's ordered rule list; the first matching rule deletes
//! it. Rules look at the current state and the full state history because a
//! polygon can be stamped coplanar during splitting and then classified
//! inside or outside.

use crate::mesh::polygon::{Polygon, PolygonState};
use crate::octree::Octree;

use PolygonState::{CoplanarBack, CoplanarFront, Inside, Outside, Undecided};

/// A predicate over a polygon's state history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRule {
    /// Current state, previous state (unless undecided) and the whole history are this state.
    Only(PolygonState),
    /// Every state seen is in the set, and every member of the set has been seen.
    AllOf(&'static [PolygonState]),
}

impl StateRule {
    pub fn matches(&self, polygon: &Polygon) -> bool {
        match self {
            StateRule::Only(state) => polygon.check_all_states(*state),
            StateRule::AllOf(set) => {
                let state = polygon.state();
                let previous = polygon.previous_state();
                let history = polygon.previous_states();
                set.contains(&state)
                    && (previous == Undecided || set.contains(&previous))
                    && history.iter().all(|s| set.contains(s))
                    && set.iter().all(|s| *s == state || history.contains(s))
            },
        }
    }
}

/// Deletion rules for both operands of one operation.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub a: &'static [StateRule],
    pub b: &'static [StateRule],
}

pub const UNION: RuleSet = RuleSet {
    a: &[
        StateRule::AllOf(&[Inside, CoplanarBack]),
        StateRule::Only(Inside),
    ],
    b: &[
        StateRule::AllOf(&[Inside, CoplanarBack]),
        StateRule::AllOf(&[Inside, CoplanarFront]),
        StateRule::Only(Inside),
    ],
};

pub const SUBTRACT: RuleSet = RuleSet {
    a: &[
        StateRule::AllOf(&[Inside, CoplanarBack]),
        StateRule::AllOf(&[Inside, CoplanarFront]),
        StateRule::Only(Inside),
    ],
    b: &[
        StateRule::AllOf(&[Outside, CoplanarBack]),
        StateRule::AllOf(&[Outside, CoplanarFront]),
        StateRule::AllOf(&[Inside, CoplanarFront]),
        StateRule::Only(Outside),
    ],
};

pub const INTERSECT: RuleSet = RuleSet {
    a: &[
        StateRule::AllOf(&[Inside, CoplanarBack]),
        StateRule::AllOf(&[Outside, CoplanarFront]),
        StateRule::AllOf(&[Outside, CoplanarBack]),
        StateRule::Only(Outside),
    ],
    b: &[
        StateRule::AllOf(&[Inside, CoplanarFront]),
        StateRule::AllOf(&[Inside, CoplanarBack]),
        StateRule::AllOf(&[Outside, CoplanarFront]),
        StateRule::AllOf(&[Outside, CoplanarBack]),
        StateRule::Only(Outside),
    ],
};

/// Whether the first matching rule in `rules` dooms `polygon`.
pub fn is_doomed(rules: &[StateRule], polygon: &Polygon) -> bool {
    rules.iter().any(|rule| rule.matches(polygon))
}

impl Octree {
    /// Free every valid, intersecting polygon matched by one of `rules`.
    pub fn delete_polygons_by_rules(&mut self, rules: &[StateRule]) -> usize {
        self.delete_polygons_where(|p| p.valid && p.intersects && is_doomed(rules, p))
    }
}
