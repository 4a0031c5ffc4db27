//! Nested operation descriptors.
//!
//! A descriptor names an operation and its operands; each operand is either
//! a leaf solid or another descriptor, resolved depth first. The leaf type is
//! generic so the same tree can carry live octrees or their encoded bytes
//! (what a worker receives).

use super::BooleanOp;
use crate::config::CsgOptions;
use crate::errors::CsgError;
use crate::octree::Octree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Union,
    Subtract,
    Intersect,
    UnionArray,
    SubtractArray,
    IntersectArray,
}

impl OperationKind {
    /// Binary kinds take exactly two operands.
    pub const fn is_binary(self) -> bool {
        matches!(
            self,
            OperationKind::Union | OperationKind::Subtract | OperationKind::Intersect
        )
    }

    /// The pairwise operation applied by this kind.
    pub const fn boolean(self) -> BooleanOp {
        match self {
            OperationKind::Union | OperationKind::UnionArray => BooleanOp::Union,
            OperationKind::Subtract | OperationKind::SubtractArray => BooleanOp::Subtract,
            OperationKind::Intersect | OperationKind::IntersectArray => BooleanOp::Intersect,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Operand<T = Octree> {
    Leaf(T),
    Operation(Box<CsgOperation<T>>),
}

impl<T> From<CsgOperation<T>> for Operand<T> {
    fn from(operation: CsgOperation<T>) -> Self {
        Operand::Operation(Box::new(operation))
    }
}

impl From<Octree> for Operand<Octree> {
    fn from(octree: Octree) -> Self {
        Operand::Leaf(octree)
    }
}

#[derive(Debug, Clone)]
pub struct CsgOperation<T = Octree> {
    pub kind: OperationKind,
    pub operands: Vec<Operand<T>>,
}

impl<T> CsgOperation<T> {
    pub fn new(kind: OperationKind, operands: Vec<Operand<T>>) -> Self {
        Self { kind, operands }
    }

    pub fn union(a: impl Into<Operand<T>>, b: impl Into<Operand<T>>) -> Self {
        Self::new(OperationKind::Union, vec![a.into(), b.into()])
    }

    pub fn subtract(a: impl Into<Operand<T>>, b: impl Into<Operand<T>>) -> Self {
        Self::new(OperationKind::Subtract, vec![a.into(), b.into()])
    }

    pub fn intersect(a: impl Into<Operand<T>>, b: impl Into<Operand<T>>) -> Self {
        Self::new(OperationKind::Intersect, vec![a.into(), b.into()])
    }

    pub fn union_array<I: IntoIterator<Item = Operand<T>>>(objs: I) -> Self {
        Self::new(OperationKind::UnionArray, objs.into_iter().collect())
    }

    pub fn subtract_array<I: IntoIterator<Item = Operand<T>>>(objs: I) -> Self {
        Self::new(OperationKind::SubtractArray, objs.into_iter().collect())
    }

    pub fn intersect_array<I: IntoIterator<Item = Operand<T>>>(objs: I) -> Self {
        Self::new(OperationKind::IntersectArray, objs.into_iter().collect())
    }

    /// Reject operand counts the kind cannot take, at every level.
    pub fn validate(&self) -> Result<(), CsgError> {
        if self.kind.is_binary() && self.operands.len() != 2 {
            return Err(CsgError::MalformedOperation(format!(
                "{:?} takes 2 operands, got {}",
                self.kind,
                self.operands.len()
            )));
        }
        if !self.kind.is_binary() && self.operands.is_empty() {
            return Err(CsgError::MalformedOperation(format!(
                "{:?} needs at least one operand",
                self.kind
            )));
        }
        for operand in &self.operands {
            if let Operand::Operation(nested) = operand {
                nested.validate()?;
            }
        }
        Ok(())
    }

    /// Same tree with every leaf converted by `f`.
    pub fn try_map<U, E, F>(self, f: &mut F) -> Result<CsgOperation<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let operands = self
            .operands
            .into_iter()
            .map(|operand| match operand {
                Operand::Leaf(leaf) => f(leaf).map(Operand::Leaf),
                Operand::Operation(nested) => (*nested).try_map(f).map(Operand::from),
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(CsgOperation::new(self.kind, operands))
    }
}

impl CsgOperation<Octree> {
    /// Encode every leaf for shipping to a worker.
    pub fn encode(self) -> Result<CsgOperation<Vec<u8>>, CsgError> {
        self.try_map(&mut |octree: Octree| octree.encode())
    }
}

impl CsgOperation<Vec<u8>> {
    /// Decode every leaf.
    pub fn decode(self, options: &CsgOptions) -> Result<CsgOperation<Octree>, CsgError> {
        let settings = options.octree;
        self.try_map(&mut |bytes: Vec<u8>| {
            Octree::decode_with(&bytes, &Default::default(), settings)
        })
    }
}

impl CsgOptions {
    /// Resolve a descriptor on the calling thread.
    pub fn operation(&self, operation: CsgOperation) -> Result<Octree, CsgError> {
        operation.validate()?;
        self.resolve(operation)
    }

    fn resolve(&self, operation: CsgOperation) -> Result<Octree, CsgError> {
        let operands = operation
            .operands
            .into_iter()
            .map(|operand| self.resolve_operand(operand))
            .collect::<Result<Vec<_>, _>>()?;

        let kind = operation.kind;
        if kind.is_binary() {
            let [a, b] = <[Octree; 2]>::try_from(operands).map_err(|operands| {
                CsgError::MalformedOperation(format!("{kind:?} takes 2 operands, got {}", operands.len()))
            })?;
            return self.boolean(kind.boolean(), a, b);
        }
        match kind {
            OperationKind::SubtractArray => self.subtract_array(operands),
            _ => self.reduce(kind.boolean(), operands),
        }
    }

    pub(crate) fn resolve_operand(&self, operand: Operand) -> Result<Octree, CsgError> {
        match operand {
            Operand::Leaf(octree) => Ok(octree),
            Operand::Operation(nested) => self.resolve(*nested),
        }
    }
}

/// [`CsgOptions::operation`] with default options.
pub fn operation(operation: CsgOperation) -> Result<Octree, CsgError> {
    CsgOptions::default().operation(operation)
}
