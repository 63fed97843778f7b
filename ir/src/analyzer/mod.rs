//! Symbolic proof and simplification engine.
//!
//! The [`Analyzer`] answers the questions message passing needs: "can this
//! condition be proven under the current variable bindings", "what is the
//! tightest constant interval of this expression", and "what is the
//! canonical form of this index". It is deliberately incomplete: a `false`
//! from [`Analyzer::can_prove`] means "not proven", never "disproven".
//!
//! Results are memoized per analyzer. Every cache is keyed on the interned
//! expression id and flushed whenever a new binding is added, so a cached
//! answer is always a function of `(expression, bindings)`.

mod bound;
mod linear;

use std::collections::HashMap;

pub use bound::{ConstIntBound, NEG_INF, POS_INF};
pub(crate) use linear::LinearForm;

use crate::context::Context;
use crate::expr::{Expr, ExprId, VarId};
use crate::range::Range;
use crate::types::{BinaryOp, CmpOp, DType, floor_div};

#[derive(Debug, Clone)]
pub struct Analyzer {
    bindings: HashMap<VarId, Range>,
    memoize: bool,
    simplify_cache: HashMap<ExprId, ExprId>,
    prove_cache: HashMap<ExprId, bool>,
    bound_cache: HashMap<ExprId, ConstIntBound>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            memoize: true,
            simplify_cache: HashMap::new(),
            prove_cache: HashMap::new(),
            bound_cache: HashMap::new(),
        }
    }

    /// Analyzer that recomputes every query.
    pub fn without_memoization() -> Self {
        Self { memoize: false, ..Self::new() }
    }

    /// Declare that `var` ranges over `range`.
    ///
    /// Rebinding a variable replaces its range.
    pub fn bind(&mut self, var: VarId, range: Range) {
        self.bindings.insert(var, range);
        self.simplify_cache.clear();
        self.prove_cache.clear();
        self.bound_cache.clear();
    }

    pub fn binding(&self, var: VarId) -> Option<Range> {
        self.bindings.get(&var).copied()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Constant interval of `id` under the current bindings.
    pub fn const_int_bound(&mut self, ctx: &Context, id: ExprId) -> ConstIntBound {
        if self.memoize {
            if let Some(bound) = self.bound_cache.get(&id) {
                return *bound;
            }
        }
        let bound = bound::compute_bound(ctx, id, &self.bindings, &HashMap::new(), 0);
        if self.memoize {
            self.bound_cache.insert(id, bound);
        }
        bound
    }

    /// Whether `cond` holds for every assignment consistent with the bindings.
    pub fn can_prove(&mut self, ctx: &mut Context, cond: ExprId) -> bool {
        if self.memoize {
            if let Some(&proven) = self.prove_cache.get(&cond) {
                return proven;
            }
        }
        let simplified = self.simplify(ctx, cond);
        let proven = match ctx.expr(simplified).clone() {
            Expr::Const { value, .. } => value != 0,
            Expr::And(a, b) => self.can_prove(ctx, a) && self.can_prove(ctx, b),
            _ => false,
        };
        if self.memoize {
            self.prove_cache.insert(cond, proven);
        }
        proven
    }

    pub fn can_prove_equal(&mut self, ctx: &mut Context, lhs: ExprId, rhs: ExprId) -> bool {
        if lhs == rhs {
            return true;
        }
        let diff = ctx.sub(lhs, rhs);
        let diff = self.simplify(ctx, diff);
        ctx.is_zero(diff)
    }

    /// Canonicalize `id`.
    ///
    /// Affine sub-expressions are normalized into a sum of atoms ordered by
    /// id; division, modulo, `min`/`max` and comparisons are folded whenever
    /// the bound analysis decides them.
    pub fn simplify(&mut self, ctx: &mut Context, id: ExprId) -> ExprId {
        if self.memoize {
            if let Some(&done) = self.simplify_cache.get(&id) {
                return done;
            }
        }
        let result = self.simplify_node(ctx, id);
        if self.memoize {
            self.simplify_cache.insert(id, result);
        }
        result
    }

    fn simplify_node(&mut self, ctx: &mut Context, id: ExprId) -> ExprId {
        let dtype = ctx.dtype(id);
        match ctx.expr(id).clone() {
            Expr::Const { .. } | Expr::Var(_) => id,
            Expr::Binary(op @ (BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul), a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                let (la, lb) = (LinearForm::of(ctx, a), LinearForm::of(ctx, b));
                let combined = match op {
                    BinaryOp::Add => la.checked_add(&lb),
                    BinaryOp::Sub => la.checked_sub(&lb),
                    _ => match (la.as_const(), lb.as_const()) {
                        (_, Some(c)) => la.checked_scale(c),
                        (Some(c), _) => lb.checked_scale(c),
                        _ => return self.commutative_atom(ctx, op, a, b),
                    },
                };
                match combined {
                    Some(form) => form.to_expr(ctx, dtype),
                    None => ctx.binary(op, a, b),
                }
            }
            Expr::Binary(op @ (BinaryOp::FloorDiv | BinaryOp::FloorMod), a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                match ctx.as_const(b) {
                    Some(c) if c > 0 => self.simplify_div_mod(ctx, op, a, c, dtype),
                    Some(0) => ctx.intern(Expr::Binary(op, a, b)),
                    _ => ctx.binary(op, a, b),
                }
            }
            Expr::Binary(op @ (BinaryOp::Min | BinaryOp::Max), a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                let diff = self.linear_difference(ctx, a, b);
                let bound = diff.map(|d| self.const_int_bound(ctx, d));
                match (op, bound) {
                    (BinaryOp::Min, Some(bd)) if bd.max <= 0 => a,
                    (BinaryOp::Min, Some(bd)) if bd.min >= 0 => b,
                    (BinaryOp::Max, Some(bd)) if bd.max <= 0 => b,
                    (BinaryOp::Max, Some(bd)) if bd.min >= 0 => a,
                    _ => self.commutative_atom(ctx, op, a, b),
                }
            }
            Expr::Cmp(op, a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                let decided = self
                    .linear_difference(ctx, a, b)
                    .and_then(|diff| {
                        let bound = self.const_int_bound(ctx, diff);
                        decide_cmp(op, bound)
                    });
                match decided {
                    Some(value) => ctx.bool_const(value),
                    None => ctx.cmp(op, a, b),
                }
            }
            Expr::And(a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                ctx.and(a, b)
            }
            Expr::Or(a, b) => {
                let (a, b) = (self.simplify(ctx, a), self.simplify(ctx, b));
                ctx.or(a, b)
            }
            Expr::Not(a) => {
                let a = self.simplify(ctx, a);
                match ctx.expr(a).clone() {
                    Expr::Cmp(op, x, y) => {
                        let negated = match op {
                            CmpOp::Lt => CmpOp::Ge,
                            CmpOp::Le => CmpOp::Gt,
                            CmpOp::Gt => CmpOp::Le,
                            CmpOp::Ge => CmpOp::Lt,
                            CmpOp::Eq => CmpOp::Ne,
                            CmpOp::Ne => CmpOp::Eq,
                        };
                        ctx.cmp(negated, x, y)
                    }
                    _ => ctx.not(a),
                }
            }
            expr @ Expr::Call { .. } => {
                let args: Vec<ExprId> = expr.children().into_iter().map(|arg| self.simplify(ctx, arg)).collect();
                ctx.intern(expr.with_children(&args))
            }
        }
    }

    /// `floordiv(a, c)` / `floormod(a, c)` for a positive literal `c`.
    ///
    /// Terms of `a` whose coefficients are multiples of `c` move out of the
    /// division. The rest is dropped or folded to a constant when its bound
    /// fits inside one block of `c`.
    fn simplify_div_mod(
        &mut self,
        ctx: &mut Context,
        op: BinaryOp,
        a: ExprId,
        c: i64,
        dtype: DType,
    ) -> ExprId {
        let form = LinearForm::of(ctx, a);
        let (quotient, remainder) = form.split_by(c);
        let rem_expr = remainder.to_expr(ctx, dtype);
        let bound = self.const_int_bound(ctx, rem_expr);
        let block = if bound.is_finite() {
            let lo = floor_div(bound.min, c);
            let hi = floor_div(bound.max, c);
            if lo == hi { lo } else { None }
        } else {
            None
        };
        let divisor = ctx.const_int(c, dtype);
        match (op, block) {
            (BinaryOp::FloorDiv, Some(k)) => match quotient.checked_add(&LinearForm::constant(k)) {
                Some(q) => q.to_expr(ctx, dtype),
                None => ctx.binary(op, a, divisor),
            },
            (BinaryOp::FloorMod, Some(k)) => match k.checked_mul(c).and_then(|kc| {
                remainder.checked_sub(&LinearForm::constant(kc))
            }) {
                Some(r) => r.to_expr(ctx, dtype),
                None => ctx.binary(op, a, divisor),
            },
            (BinaryOp::FloorDiv, None) => {
                if quotient.terms.is_empty() && quotient.constant == 0 {
                    return ctx.binary(op, rem_expr, divisor);
                }
                let inner = ctx.binary(op, rem_expr, divisor);
                match quotient.checked_add(&LinearForm::atom(inner)) {
                    Some(q) => q.to_expr(ctx, dtype),
                    None => ctx.binary(op, a, divisor),
                }
            }
            _ => ctx.binary(op, rem_expr, divisor),
        }
    }

    /// `a - b` in linear normal form, or `None` on coefficient overflow.
    fn linear_difference(&mut self, ctx: &mut Context, a: ExprId, b: ExprId) -> Option<ExprId> {
        let dtype = ctx.dtype(a).promote(ctx.dtype(b));
        let diff = LinearForm::of(ctx, a).checked_sub(&LinearForm::of(ctx, b))?;
        Some(diff.to_expr(ctx, dtype))
    }

    /// Non-linear commutative node with operands in id order.
    fn commutative_atom(&mut self, ctx: &mut Context, op: BinaryOp, a: ExprId, b: ExprId) -> ExprId {
        let (a, b) = if op.is_commutative() && b < a { (b, a) } else { (a, b) };
        ctx.binary(op, a, b)
    }
}

fn decide_cmp(op: CmpOp, diff: ConstIntBound) -> Option<bool> {
    match op {
        CmpOp::Lt if diff.max < 0 => Some(true),
        CmpOp::Lt if diff.min >= 0 => Some(false),
        CmpOp::Le if diff.max <= 0 => Some(true),
        CmpOp::Le if diff.min > 0 => Some(false),
        CmpOp::Gt if diff.min > 0 => Some(true),
        CmpOp::Gt if diff.max <= 0 => Some(false),
        CmpOp::Ge if diff.min >= 0 => Some(true),
        CmpOp::Ge if diff.max < 0 => Some(false),
        CmpOp::Eq if diff.is_const() && diff.min == 0 => Some(true),
        CmpOp::Eq if diff.min > 0 || diff.max < 0 => Some(false),
        CmpOp::Ne if diff.is_const() && diff.min == 0 => Some(false),
        CmpOp::Ne if diff.min > 0 || diff.max < 0 => Some(true),
        _ => None,
    }
}
