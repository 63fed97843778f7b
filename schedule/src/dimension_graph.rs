//! Dimension relations for non-rectangular (ragged) iteration spaces.
//!
//! Where [`Stage`](crate::Stage) relates loop variables, a
//! [`DimensionRelationGraph`] relates abstract [`Dimension`](tessera_ir::Dimension)s
//! of an operation. Besides split and fuse it has `Change`, which moves between
//! two equivalent coordinate systems through the uninterpreted functions
//! that define the old dimensions.

use smallvec::SmallVec;
use snafu::OptionExt;

use tessera_ir::{Context, DimId, FunId, IterVarId};

use crate::error::*;
use crate::relation::SplitFactor;

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum DimensionRelation {
    Split { parent: DimId, outer: DimId, inner: DimId, factor: SplitFactor },
    Fuse { outer: DimId, inner: DimId, fused: DimId },
    /// `old_dims` and `new_dims` describe the same points; each old dimension
    /// is a function of the new ones.
    Change { old_dims: SmallVec<[DimId; 4]>, new_dims: SmallVec<[DimId; 4]> },
}

/// Dimension relations in declaration (topological) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionRelationGraph {
    relations: Vec<DimensionRelation>,
}

impl DimensionRelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &[DimensionRelation] {
        &self.relations
    }

    pub fn split(&mut self, parent: DimId, outer: DimId, inner: DimId, factor: SplitFactor) {
        self.relations.push(DimensionRelation::Split { parent, outer, inner, factor });
    }

    pub fn fuse(&mut self, outer: DimId, inner: DimId, fused: DimId) {
        self.relations.push(DimensionRelation::Fuse { outer, inner, fused });
    }

    pub fn change(&mut self, old_dims: &[DimId], new_dims: &[DimId]) {
        self.relations.push(DimensionRelation::Change {
            old_dims: SmallVec::from_slice(old_dims),
            new_dims: SmallVec::from_slice(new_dims),
        });
    }
}

/// Defines dimension `dim` of an operation: its loop variable `iv` and the
/// function `value_expr` giving the dimension's value in terms of other
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimVarEntry {
    pub dim: DimId,
    pub iv: IterVarId,
    pub value_expr: FunId,
}

/// The parts of a compute operation dimension propagation reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeOp {
    pub name: String,
    pub root_dims: Vec<DimId>,
    pub dim_var_entries: Vec<DimVarEntry>,
    pub dim_relation_graph: DimensionRelationGraph,
}

impl ComputeOp {
    pub fn new(name: impl Into<String>, root_dims: &[DimId]) -> Self {
        Self {
            name: name.into(),
            root_dims: root_dims.to_vec(),
            dim_var_entries: Vec::new(),
            dim_relation_graph: DimensionRelationGraph::new(),
        }
    }

    pub fn dim_var_entry(&self, ctx: &Context, dim: DimId) -> Result<&DimVarEntry> {
        self.dim_var_entries.iter().find(|entry| entry.dim == dim).context(MissingDimVarEntrySnafu {
            op: self.name.clone(),
            dimension: ctx.dimension(dim).name.clone(),
        })
    }
}
