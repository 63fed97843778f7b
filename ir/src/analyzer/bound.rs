//! Constant integer bounds (interval analysis).
//!
//! Infinite endpoints are represented by `i64::MIN` / `i64::MAX`; arithmetic
//! is carried out in `i128` and clamped back, so any overflow widens to
//! infinity instead of wrapping.

use std::collections::HashMap;

use crate::context::Context;
use crate::expr::{Expr, ExprId, VarId};
use crate::range::Range;
use crate::types::{BinaryOp, floor_div, floor_mod};

pub const NEG_INF: i64 = i64::MIN;
pub const POS_INF: i64 = i64::MAX;

/// Depth past which variable bindings are no longer chased.
const MAX_BINDING_DEPTH: usize = 16;

/// Inclusive interval `[min, max]` of possible values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstIntBound {
    pub min: i64,
    pub max: i64,
}

fn clamp(value: i128) -> i64 {
    if value <= NEG_INF as i128 {
        NEG_INF
    } else if value >= POS_INF as i128 {
        POS_INF
    } else {
        value as i64
    }
}

fn is_inf(v: i64) -> bool {
    v == NEG_INF || v == POS_INF
}

impl ConstIntBound {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub const fn single(value: i64) -> Self {
        Self { min: value, max: value }
    }

    pub const fn everything() -> Self {
        Self { min: NEG_INF, max: POS_INF }
    }

    pub fn is_const(&self) -> bool {
        self.min == self.max && !is_inf(self.min)
    }

    pub fn is_finite(&self) -> bool {
        !is_inf(self.min) && !is_inf(self.max)
    }

    pub fn is_non_negative(&self) -> bool {
        self.min >= 0
    }

    pub fn union(self, other: Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    pub fn intersect(self, other: Self) -> Self {
        Self { min: self.min.max(other.min), max: self.max.min(other.max) }
    }

    pub fn add(self, rhs: Self) -> Self {
        let min = if self.min == NEG_INF || rhs.min == NEG_INF {
            NEG_INF
        } else {
            clamp(self.min as i128 + rhs.min as i128)
        };
        let max = if self.max == POS_INF || rhs.max == POS_INF {
            POS_INF
        } else {
            clamp(self.max as i128 + rhs.max as i128)
        };
        Self { min, max }
    }

    pub fn neg(self) -> Self {
        let flip = |v: i64| match v {
            NEG_INF => POS_INF,
            POS_INF => NEG_INF,
            v => -v,
        };
        Self { min: flip(self.max), max: flip(self.min) }
    }

    pub fn sub(self, rhs: Self) -> Self {
        self.add(rhs.neg())
    }

    /// Scale by a finite constant.
    pub fn scale(self, c: i64) -> Self {
        let mul = |v: i64| -> i64 {
            match v {
                NEG_INF if c > 0 => NEG_INF,
                NEG_INF => POS_INF,
                POS_INF if c > 0 => POS_INF,
                POS_INF => NEG_INF,
                v => clamp(v as i128 * c as i128),
            }
        };
        match c.signum() {
            0 => Self::single(0),
            1 => Self { min: mul(self.min), max: mul(self.max) },
            _ => Self { min: mul(self.max), max: mul(self.min) },
        }
    }

    pub fn mul(self, rhs: Self) -> Self {
        if rhs.is_const() {
            return self.scale(rhs.min);
        }
        if self.is_const() {
            return rhs.scale(self.min);
        }
        if !self.is_finite() || !rhs.is_finite() {
            return Self::everything();
        }
        let corners = [
            self.min as i128 * rhs.min as i128,
            self.min as i128 * rhs.max as i128,
            self.max as i128 * rhs.min as i128,
            self.max as i128 * rhs.max as i128,
        ];
        let lo = corners.iter().copied().min().unwrap_or(i128::MIN);
        let hi = corners.iter().copied().max().unwrap_or(i128::MAX);
        Self { min: clamp(lo), max: clamp(hi) }
    }

    pub fn floordiv(self, rhs: Self) -> Self {
        if rhs.is_const() && rhs.min != 0 {
            let c = rhs.min;
            let div = |v: i64| -> i64 {
                if is_inf(v) {
                    if (v == POS_INF) == (c > 0) { POS_INF } else { NEG_INF }
                } else {
                    floor_div(v, c).unwrap_or(v)
                }
            };
            return if c > 0 {
                Self { min: div(self.min), max: div(self.max) }
            } else {
                Self { min: div(self.max), max: div(self.min) }
            };
        }
        if rhs.min > 0 && self.is_finite() && rhs.is_finite() {
            let candidates = [
                floor_div(self.min, rhs.min),
                floor_div(self.min, rhs.max),
                floor_div(self.max, rhs.min),
                floor_div(self.max, rhs.max),
            ];
            let values: Vec<i64> = candidates.into_iter().flatten().collect();
            if let (Some(lo), Some(hi)) = (values.iter().min(), values.iter().max()) {
                return Self { min: *lo, max: *hi };
            }
        }
        Self::everything()
    }

    pub fn floormod(self, rhs: Self) -> Self {
        if rhs.min > 0 {
            if rhs.is_const() && self.is_finite() {
                let c = rhs.min;
                if floor_div(self.min, c) == floor_div(self.max, c) {
                    if let (Some(lo), Some(hi)) = (floor_mod(self.min, c), floor_mod(self.max, c)) {
                        return Self { min: lo, max: hi };
                    }
                }
            }
            if self.min >= 0 && self.max < rhs.min {
                return self;
            }
            let hi = if rhs.max == POS_INF { POS_INF } else { rhs.max - 1 };
            return Self { min: 0, max: hi };
        }
        if rhs.max < 0 {
            let lo = if rhs.min == NEG_INF { NEG_INF } else { rhs.min + 1 };
            return Self { min: lo, max: 0 };
        }
        Self::everything()
    }

    pub fn min_with(self, rhs: Self) -> Self {
        Self { min: self.min.min(rhs.min), max: self.max.min(rhs.max) }
    }

    pub fn max_with(self, rhs: Self) -> Self {
        Self { min: self.min.max(rhs.min), max: self.max.max(rhs.max) }
    }
}

/// Interval of `[r.min, r.min + r.extent - 1]` under `bound_of`.
pub(crate) fn range_bound(range: &Range, bound_of: &mut dyn FnMut(ExprId) -> ConstIntBound) -> ConstIntBound {
    let min = bound_of(range.min);
    let extent = bound_of(range.extent);
    let last = min.add(extent).add(ConstIntBound::single(-1));
    ConstIntBound::new(min.min, last.max)
}

/// Compute the bound of `id`.
///
/// `bindings` gives the declared range of bound variables; `env` overrides
/// variables with precomputed bounds (used for callee parameters).
pub(crate) fn compute_bound(
    ctx: &Context,
    id: ExprId,
    bindings: &HashMap<VarId, Range>,
    env: &HashMap<VarId, ConstIntBound>,
    depth: usize,
) -> ConstIntBound {
    let recurse = |e: ExprId| compute_bound(ctx, e, bindings, env, depth);
    match ctx.expr(id) {
        Expr::Const { value, .. } => ConstIntBound::single(*value),
        Expr::Var(v) => {
            if let Some(bound) = env.get(v) {
                return *bound;
            }
            match bindings.get(v) {
                Some(range) if depth < MAX_BINDING_DEPTH => {
                    let mut of = |e: ExprId| compute_bound(ctx, e, bindings, env, depth + 1);
                    range_bound(range, &mut of)
                }
                _ => ConstIntBound::everything(),
            }
        }
        Expr::Binary(op, a, b) => {
            let (a, b) = (recurse(*a), recurse(*b));
            match op {
                BinaryOp::Add => a.add(b),
                BinaryOp::Sub => a.sub(b),
                BinaryOp::Mul => a.mul(b),
                BinaryOp::FloorDiv => a.floordiv(b),
                BinaryOp::FloorMod => a.floormod(b),
                BinaryOp::Min => a.min_with(b),
                BinaryOp::Max => a.max_with(b),
            }
        }
        Expr::Cmp(..) | Expr::And(..) | Expr::Or(..) | Expr::Not(_) => ConstIntBound::new(0, 1),
        Expr::Call { fun, args, dims } => {
            let callee = ctx.fun(*fun);
            let declared = match callee.range() {
                Some(range) if depth < MAX_BINDING_DEPTH => {
                    let mut of = |e: ExprId| compute_bound(ctx, e, bindings, env, depth + 1);
                    range_bound(&range, &mut of)
                }
                _ => ConstIntBound::everything(),
            };
            let Some(body) = callee.body() else {
                return declared;
            };
            if depth >= MAX_BINDING_DEPTH {
                return declared;
            }
            let mut inner = HashMap::new();
            for (param, dim) in callee.parameters().iter().zip(callee.dimensions()) {
                let bound = dims
                    .iter()
                    .position(|d| d == dim)
                    .and_then(|pos| args.get(pos))
                    .map(|&arg| recurse(arg))
                    .unwrap_or_else(ConstIntBound::everything);
                inner.insert(*param, bound);
            }
            let empty = HashMap::new();
            compute_bound(ctx, body, &empty, &inner, depth + 1).intersect(declared)
        }
    }
}
