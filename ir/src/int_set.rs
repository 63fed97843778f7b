//! Conservative value-set abstraction.
//!
//! An [`IntSet`] is a symbolic closed interval whose endpoints may be
//! missing (unbounded). A single point is the interval `[e, e]`. Sets are
//! only ever widened, so every operation here over-approximates.

use std::collections::HashMap;

use crate::analyzer::Analyzer;
use crate::context::Context;
use crate::expr::{Expr, ExprId, VarId};
use crate::range::Range;
use crate::types::BinaryOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntSet {
    min: Option<ExprId>,
    max: Option<ExprId>,
}

impl IntSet {
    pub fn single_point(value: ExprId) -> Self {
        Self { min: Some(value), max: Some(value) }
    }

    /// Closed interval `[min, max]`.
    pub fn interval(min: ExprId, max: ExprId) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    /// `[r.min, r.min + r.extent - 1]`.
    pub fn range(ctx: &mut Context, r: Range) -> Self {
        if r.is_single_point(ctx) {
            return Self::single_point(r.min);
        }
        Self { min: Some(r.min), max: Some(r.max_inclusive(ctx)) }
    }

    pub fn everything() -> Self {
        Self { min: None, max: None }
    }

    pub fn min(&self) -> Option<ExprId> {
        self.min
    }

    pub fn max(&self) -> Option<ExprId> {
        self.max
    }

    pub fn is_everything(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn is_single_point(&self) -> bool {
        self.min.is_some() && self.min == self.max
    }

    pub fn point_value(&self) -> Option<ExprId> {
        if self.is_single_point() { self.min } else { None }
    }

    /// Whether this set covers exactly `r`.
    pub fn match_range(&self, ctx: &mut Context, analyzer: &mut Analyzer, r: Range) -> bool {
        let (Some(min), Some(max)) = (self.min, self.max) else {
            return false;
        };
        let r_max = r.max_inclusive(ctx);
        analyzer.can_prove_equal(ctx, min, r.min) && analyzer.can_prove_equal(ctx, max, r_max)
    }

    /// Convert back into a `(min, extent)` range. `None` if unbounded.
    pub fn to_range(&self, ctx: &mut Context, analyzer: &mut Analyzer) -> Option<Range> {
        let (min, max) = (self.min?, self.max?);
        let end = ctx.sub(max, min);
        let extent = ctx.add_const(end, 1);
        Some(Range::from_min_extent(min, analyzer.simplify(ctx, extent)))
    }

    /// Smallest interval containing both sets.
    pub fn union(&self, ctx: &mut Context, analyzer: &mut Analyzer, other: &IntSet) -> IntSet {
        let min = match (self.min, other.min) {
            (Some(a), Some(b)) => {
                let m = ctx.min(a, b);
                Some(analyzer.simplify(ctx, m))
            }
            _ => None,
        };
        let max = match (self.max, other.max) {
            (Some(a), Some(b)) => {
                let m = ctx.max(a, b);
                Some(analyzer.simplify(ctx, m))
            }
            _ => None,
        };
        IntSet { min, max }
    }

    fn map_endpoints(
        &self,
        ctx: &mut Context,
        analyzer: &mut Analyzer,
        f: impl Fn(&mut Context, ExprId) -> ExprId,
    ) -> IntSet {
        let mut apply = |e: Option<ExprId>| {
            e.map(|e| {
                let e = f(ctx, e);
                analyzer.simplify(ctx, e)
            })
        };
        let min = apply(self.min);
        let max = apply(self.max);
        IntSet { min, max }
    }
}

/// Evaluate the set of values `e` can take when each variable in `dom_map`
/// ranges over its set. Variables missing from the map are treated as fixed
/// symbols.
pub fn eval_set(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    e: ExprId,
    dom_map: &HashMap<VarId, IntSet>,
) -> IntSet {
    match ctx.expr(e).clone() {
        Expr::Const { .. } => IntSet::single_point(e),
        Expr::Var(v) => dom_map.get(&v).copied().unwrap_or_else(|| IntSet::single_point(e)),
        Expr::Binary(op, a, b) => {
            let sa = eval_set(ctx, analyzer, a, dom_map);
            let sb = eval_set(ctx, analyzer, b, dom_map);
            if let (Some(pa), Some(pb)) = (sa.point_value(), sb.point_value()) {
                let value = match op {
                    BinaryOp::FloorDiv | BinaryOp::FloorMod if ctx.is_zero(pb) => return IntSet::everything(),
                    _ => ctx.binary(op, pa, pb),
                };
                return IntSet::single_point(analyzer.simplify(ctx, value));
            }
            eval_binary(ctx, analyzer, op, sa, sb)
        }
        expr @ (Expr::Cmp(..) | Expr::And(..) | Expr::Or(..) | Expr::Not(_)) => {
            let mut points = Vec::new();
            for child in expr.children() {
                match eval_set(ctx, analyzer, child, dom_map).point_value() {
                    Some(p) => points.push(p),
                    None => {
                        let (zero, one) = (ctx.bool_const(false), ctx.bool_const(true));
                        return IntSet::interval(zero, one);
                    }
                }
            }
            let value = ctx.rebuild(&expr, &points);
            IntSet::single_point(analyzer.simplify(ctx, value))
        }
        Expr::Call { fun, args, dims } => {
            let mut points = Vec::with_capacity(args.len());
            for &arg in &args {
                match eval_set(ctx, analyzer, arg, dom_map).point_value() {
                    Some(p) => points.push(p),
                    None => break,
                }
            }
            if points.len() == args.len() {
                return IntSet::single_point(ctx.call(fun, &points, &dims));
            }
            match ctx.fun(fun).range() {
                Some(range) => IntSet::range(ctx, range),
                None => IntSet::everything(),
            }
        }
    }
}

fn eval_binary(ctx: &mut Context, analyzer: &mut Analyzer, op: BinaryOp, a: IntSet, b: IntSet) -> IntSet {
    let both = |x: Option<ExprId>, y: Option<ExprId>| x.zip(y);
    let finish = |ctx: &mut Context, analyzer: &mut Analyzer, min: Option<ExprId>, max: Option<ExprId>| IntSet {
        min: min.map(|m| analyzer.simplify(ctx, m)),
        max: max.map(|m| analyzer.simplify(ctx, m)),
    };
    match op {
        BinaryOp::Add => {
            let min = both(a.min, b.min).map(|(x, y)| ctx.add(x, y));
            let max = both(a.max, b.max).map(|(x, y)| ctx.add(x, y));
            finish(ctx, analyzer, min, max)
        }
        BinaryOp::Sub => {
            let min = both(a.min, b.max).map(|(x, y)| ctx.sub(x, y));
            let max = both(a.max, b.min).map(|(x, y)| ctx.sub(x, y));
            finish(ctx, analyzer, min, max)
        }
        BinaryOp::Mul => {
            let (set, factor) = match (a.point_value(), b.point_value()) {
                (_, Some(p)) => (a, p),
                (Some(p), _) => (b, p),
                _ => return IntSet::everything(),
            };
            let zero = ctx.zero(ctx.dtype(factor));
            let non_negative = ctx.ge(factor, zero);
            if analyzer.can_prove(ctx, non_negative) {
                return set.map_endpoints(ctx, analyzer, |ctx, e| ctx.mul(e, factor));
            }
            let non_positive = ctx.le(factor, zero);
            if analyzer.can_prove(ctx, non_positive) {
                let min = set.max.map(|e| ctx.mul(e, factor));
                let max = set.min.map(|e| ctx.mul(e, factor));
                return finish(ctx, analyzer, min, max);
            }
            IntSet::everything()
        }
        BinaryOp::FloorDiv => {
            let Some(divisor) = b.point_value() else {
                return IntSet::everything();
            };
            let zero = ctx.zero(ctx.dtype(divisor));
            let positive = ctx.gt(divisor, zero);
            if !analyzer.can_prove(ctx, positive) {
                return IntSet::everything();
            }
            let mut out = IntSet::everything();
            for (slot, endpoint) in [(&mut out.min, a.min), (&mut out.max, a.max)] {
                if let Some(e) = endpoint {
                    // Positive literal divisor: cannot fail.
                    if let Ok(q) = ctx.floordiv(e, divisor) {
                        *slot = Some(analyzer.simplify(ctx, q));
                    }
                }
            }
            out
        }
        BinaryOp::FloorMod => {
            let Some(divisor) = b.point_value() else {
                return IntSet::everything();
            };
            let zero = ctx.zero(ctx.dtype(divisor));
            let positive = ctx.gt(divisor, zero);
            if !analyzer.can_prove(ctx, positive) {
                return IntSet::everything();
            }
            if let (Some(lo), Some(hi)) = (a.min, a.max) {
                // Both endpoints inside one block of the divisor.
                if let (Ok(qlo), Ok(qhi)) = (ctx.floordiv(lo, divisor), ctx.floordiv(hi, divisor)) {
                    if analyzer.can_prove_equal(ctx, qlo, qhi) {
                        if let (Ok(mlo), Ok(mhi)) = (ctx.floormod(lo, divisor), ctx.floormod(hi, divisor)) {
                            return finish(ctx, analyzer, Some(mlo), Some(mhi));
                        }
                    }
                }
            }
            let last = ctx.add_const(divisor, -1);
            finish(ctx, analyzer, Some(zero), Some(last))
        }
        BinaryOp::Min => {
            let min = match (a.min, b.min) {
                (Some(x), Some(y)) => Some(ctx.min(x, y)),
                _ => None,
            };
            let max = match (a.max, b.max) {
                (Some(x), Some(y)) => Some(ctx.min(x, y)),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            };
            finish(ctx, analyzer, min, max)
        }
        BinaryOp::Max => {
            let min = match (a.min, b.min) {
                (Some(x), Some(y)) => Some(ctx.max(x, y)),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            };
            let max = match (a.max, b.max) {
                (Some(x), Some(y)) => Some(ctx.max(x, y)),
                _ => None,
            };
            finish(ctx, analyzer, min, max)
        }
    }
}
