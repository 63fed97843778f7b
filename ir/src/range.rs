//! Symbolic `(min, extent)` ranges.

use crate::context::Context;
use crate::expr::ExprId;

/// Half-open interval `[min, min + extent)` over symbolic bounds.
///
/// Both fields are interned ids, so two ranges compare equal exactly when
/// they are structurally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub min: ExprId,
    pub extent: ExprId,
}

impl Range {
    pub fn from_min_extent(min: ExprId, extent: ExprId) -> Self {
        Self { min, extent }
    }

    /// `[0, extent)` with a zero of the extent's dtype.
    pub fn from_extent(ctx: &mut Context, extent: ExprId) -> Self {
        let min = ctx.zero(ctx.dtype(extent));
        Self { min, extent }
    }

    /// Literal `[min, min + extent)`.
    pub fn literal(ctx: &mut Context, min: i64, extent: i64) -> Self {
        Self { min: ctx.int(min), extent: ctx.int(extent) }
    }

    /// Range `[begin, end)`.
    pub fn from_begin_end(ctx: &mut Context, begin: ExprId, end: ExprId) -> Self {
        Self { min: begin, extent: ctx.sub(end, begin) }
    }

    pub fn is_single_point(&self, ctx: &Context) -> bool {
        ctx.is_one(self.extent)
    }

    /// `min + extent - 1`.
    pub fn max_inclusive(&self, ctx: &mut Context) -> ExprId {
        let end = ctx.add(self.min, self.extent);
        ctx.add_const(end, -1)
    }

    pub fn display(&self, ctx: &Context) -> String {
        format!("range(min={}, ext={})", ctx.display(self.min), ctx.display(self.extent))
    }
}
