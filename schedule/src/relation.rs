//! Iteration-variable relations.

use tessera_ir::{ExprId, IterVarId};

/// How a split divides its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitFactor {
    /// Extent of the inner variable.
    Factor(ExprId),
    /// Extent of the outer variable.
    NParts(ExprId),
}

/// One derivation step in a stage's relation graph.
///
/// The variant set is closed; every pass matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum IterVarRelation {
    /// `parent = outer * factor + inner`.
    Split { parent: IterVarId, outer: IterVarId, inner: IterVarId, factor: SplitFactor },
    /// `fused = outer * extent(inner) + inner`.
    Fuse { outer: IterVarId, inner: IterVarId, fused: IterVarId },
    /// `rebased = parent - min(parent)`.
    Rebase { parent: IterVarId, rebased: IterVarId },
    /// `iter` takes the single value 0.
    Singleton { iter: IterVarId },
}
