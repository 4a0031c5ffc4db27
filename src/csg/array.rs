//! Booleans over lists of operands.
//!
//! Lists are reduced as a tournament: adjacent pairs are combined, an odd
//! operand out moves to the next round untouched, until one octree remains.
//! Pairs are always combined left operand first.

use super::BooleanOp;
use crate::config::CsgOptions;
use crate::errors::CsgError;
use crate::octree::Octree;

impl CsgOptions {
    /// Union of every operand; an empty list yields an empty octree.
    pub fn union_array(&self, operands: Vec<Octree>) -> Result<Octree, CsgError> {
        self.reduce(BooleanOp::Union, operands)
    }

    /// Intersection of every operand; an empty list yields an empty octree.
    pub fn intersect_array(&self, operands: Vec<Octree>) -> Result<Octree, CsgError> {
        self.reduce(BooleanOp::Intersect, operands)
    }

    /// The first operand minus the union of the others.
    pub fn subtract_array(&self, operands: Vec<Octree>) -> Result<Octree, CsgError> {
        let mut operands = operands.into_iter();
        let Some(head) = operands.next() else {
            return Ok(self.empty());
        };
        let rest: Vec<Octree> = operands.collect();
        if rest.is_empty() {
            return Ok(head);
        }
        let cutter = self.union_array(rest)?;
        self.subtract(head, cutter)
    }

    pub(crate) fn reduce(&self, op: BooleanOp, mut operands: Vec<Octree>) -> Result<Octree, CsgError> {
        if operands.is_empty() {
            return Ok(self.empty());
        }
        let mut round = 0;
        while operands.len() > 1 {
            log::trace!("{op:?} tournament round {round}: {} operands", operands.len());
            let mut next = Vec::with_capacity(operands.len().div_ceil(2));
            let mut pending = operands.into_iter();
            while let Some(left) = pending.next() {
                match pending.next() {
                    Some(right) => next.push(self.boolean(op, left, right)?),
                    None => next.push(left),
                }
            }
            operands = next;
            round += 1;
        }
        let mut result = operands.pop().unwrap_or_else(|| self.empty());
        if self.build_result {
            result.ensure_built();
        }
        Ok(result)
    }

    fn empty(&self) -> Octree {
        let mut octree = Octree::with_settings(self.octree);
        if self.build_result {
            octree.build_tree();
        }
        octree
    }
}

/// [`CsgOptions::union_array`] with default options.
pub fn union_array(operands: Vec<Octree>) -> Result<Octree, CsgError> {
    CsgOptions::default().union_array(operands)
}

/// [`CsgOptions::subtract_array`] with default options.
pub fn subtract_array(operands: Vec<Octree>) -> Result<Octree, CsgError> {
    CsgOptions::default().subtract_array(operands)
}

/// [`CsgOptions::intersect_array`] with default options.
pub fn intersect_array(operands: Vec<Octree>) -> Result<Octree, CsgError> {
    CsgOptions::default().intersect_array(operands)
}
