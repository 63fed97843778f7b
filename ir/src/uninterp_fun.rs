//! Uninterpreted functions over dimension-tagged parameters.
//!
//! An [`UninterpFun`] names a (possibly non-affine) index relation such as
//! "row offset of ragged row `i`". Each parameter is tagged with a
//! [`Dimension`](crate::Dimension); call sites supply arguments together with
//! the dimensions they stand for, and binding is by dimension identity rather
//! than by position.
//!
//! Functions whose body is affine are "simple" and get inlined into index
//! expressions. Anything else stays an opaque call until code generation.

use std::collections::HashMap;

use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::Result;
use crate::analyzer::{Analyzer, LinearForm};
use crate::context::Context;
use crate::error::{
    ArityMismatchSnafu, CallArityMismatchSnafu, FreeVariableInBodySnafu, MissingDimensionArgumentSnafu,
    NotInvertibleSnafu, UndefinedBodySnafu,
};
use crate::expr::{DimId, Expr, ExprId, FunId, VarId};
use crate::range::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninterpFun {
    fname: String,
    parameters: SmallVec<[VarId; 4]>,
    dimensions: SmallVec<[DimId; 4]>,
    body: Option<ExprId>,
    range: Option<Range>,
}

/// Result of [`UninterpFun::check_equality`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgMappingAndEquality {
    pub equals: bool,
    /// Parameter of the first function to the matching parameter of the second.
    pub mapping: HashMap<VarId, VarId>,
}

impl UninterpFun {
    /// Build a function and register it in `ctx`.
    ///
    /// Fails when `parameters` and `dimensions` differ in length, or when the
    /// body refers to a variable that is not a parameter.
    pub fn new(
        ctx: &mut Context,
        fname: impl Into<String>,
        range: Option<Range>,
        dimensions: &[DimId],
        parameters: &[VarId],
        body: Option<ExprId>,
    ) -> Result<FunId> {
        let fname = fname.into();
        ensure!(
            parameters.len() == dimensions.len(),
            ArityMismatchSnafu { fname, parameters: parameters.len(), dimensions: dimensions.len() }
        );
        if let Some(body) = body {
            check_free_vars(ctx, &fname, parameters, body)?;
        }
        let fun = UninterpFun {
            fname,
            parameters: SmallVec::from_slice(parameters),
            dimensions: SmallVec::from_slice(dimensions),
            body,
            range,
        };
        tracing::trace!(fname = %fun.fname, arity = fun.arity(), "uninterpreted function declared");
        Ok(ctx.add_fun(fun))
    }

    /// Zero-arity function returning `value`.
    pub fn from_constant(ctx: &mut Context, fname: impl Into<String>, value: ExprId) -> FunId {
        let range = Range::from_min_extent(value, ctx.one(ctx.dtype(value)));
        ctx.add_fun(UninterpFun {
            fname: fname.into(),
            parameters: SmallVec::new(),
            dimensions: SmallVec::new(),
            body: Some(value),
            range: Some(range),
        })
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }

    pub fn parameters(&self) -> &[VarId] {
        &self.parameters
    }

    pub fn dimensions(&self) -> &[DimId] {
        &self.dimensions
    }

    pub fn body(&self) -> Option<ExprId> {
        self.body
    }

    pub fn range(&self) -> Option<Range> {
        self.range
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn num_outputs(&self) -> usize {
        1
    }

    /// Position of `var` in the parameter list.
    pub fn arg_pos(&self, var: VarId) -> Option<usize> {
        self.parameters.iter().position(|p| *p == var)
    }

    /// Position of the parameter tagged with `dim`.
    pub fn dim_pos(&self, dim: DimId) -> Option<usize> {
        self.dimensions.iter().position(|d| *d == dim)
    }

    /// Whether the body is absent or not affine in the parameters.
    pub fn is_complex(&self, ctx: &Context) -> bool {
        match self.body {
            Some(body) => !ctx.is_affine(body),
            None => true,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.parameters.is_empty() && self.body.is_some()
    }

    pub fn set_range(&mut self, range: Range) {
        self.range = Some(range);
    }

    /// Replace the body. The new body must only refer to the parameters.
    pub fn set_body(ctx: &mut Context, fun: FunId, body: ExprId) -> Result<()> {
        let callee = ctx.fun(fun);
        check_free_vars(ctx, callee.fname(), callee.parameters(), body)?;
        ctx.fun_mut(fun).body = Some(body);
        Ok(())
    }

    /// Specialize the body of `fun` for `args`, where `args[i]` is the value of
    /// dimension `dims[i]`.
    ///
    /// Parameters are matched by dimension identity, so `args` may be given in
    /// any order and may carry extra dimensions the function does not use.
    pub fn substitute(ctx: &mut Context, fun: FunId, args: &[ExprId], dims: &[DimId]) -> Result<ExprId> {
        let callee = ctx.fun(fun).clone();
        ensure!(
            args.len() == dims.len(),
            CallArityMismatchSnafu { fname: callee.fname.clone(), args: args.len(), dims: dims.len() }
        );
        let body = callee.body.context(UndefinedBodySnafu { fname: callee.fname.clone() })?;
        let mut map = HashMap::with_capacity(callee.arity());
        for (param, dim) in callee.parameters.iter().zip(&callee.dimensions) {
            let pos = dims.iter().position(|d| d == dim).context(MissingDimensionArgumentSnafu {
                fname: callee.fname.clone(),
                dimension: ctx.dimension(*dim).name.clone(),
            })?;
            map.insert(*param, args[pos]);
        }
        Ok(ctx.substitute(body, &map))
    }

    /// Build a call to `fun`, inlining it right away when the body is constant.
    pub fn make_call_to(ctx: &mut Context, fun: FunId, args: &[ExprId], arg_dims: &[DimId]) -> Result<ExprId> {
        let callee = ctx.fun(fun);
        ensure!(
            args.len() == arg_dims.len(),
            CallArityMismatchSnafu { fname: callee.fname.clone(), args: args.len(), dims: arg_dims.len() }
        );
        for dim in callee.dimensions() {
            ensure!(
                arg_dims.contains(dim),
                MissingDimensionArgumentSnafu {
                    fname: callee.fname.clone(),
                    dimension: ctx.dimension(*dim).name.clone(),
                }
            );
        }
        if let (true, Some(body)) = (callee.parameters.is_empty(), callee.body) {
            return Ok(body);
        }
        Ok(ctx.call(fun, args, arg_dims))
    }

    /// Inline calls in `e`.
    ///
    /// With `only_simple`, calls to complex functions are kept as calls (their
    /// arguments are still rewritten). Calls to functions without a body are
    /// always kept.
    pub fn inline_calls(ctx: &mut Context, e: ExprId, only_simple: bool) -> Result<ExprId> {
        ctx.rewrite_post_order(e, &mut |ctx, id| {
            let Expr::Call { fun, args, dims } = ctx.expr(id).clone() else {
                return Ok(None);
            };
            let callee = ctx.fun(fun);
            if callee.body.is_none() || (only_simple && callee.is_complex(ctx)) {
                return Ok(None);
            }
            let inlined = Self::substitute(ctx, fun, &args, &dims)?;
            // The body may itself call other functions.
            Self::inline_calls(ctx, inlined, only_simple).map(Some)
        })
    }

    /// [`Self::inline_calls`] applied to both ends of a range.
    pub fn inline_calls_in_range(ctx: &mut Context, range: Range, only_simple: bool) -> Result<Range> {
        Ok(Range::from_min_extent(
            Self::inline_calls(ctx, range.min, only_simple)?,
            Self::inline_calls(ctx, range.extent, only_simple)?,
        ))
    }

    /// Replace every call to a complex function by the inclusive maximum of its
    /// declared range, inlining simple calls along the way. Calls with no
    /// declared range are kept.
    pub fn relax_complex_calls_max_inclusive(ctx: &mut Context, e: ExprId) -> Result<ExprId> {
        ctx.rewrite_post_order(e, &mut |ctx, id| {
            let Expr::Call { fun, args, dims } = ctx.expr(id).clone() else {
                return Ok(None);
            };
            let callee = ctx.fun(fun).clone();
            if !callee.is_complex(ctx) {
                let inlined = Self::substitute(ctx, fun, &args, &dims)?;
                return Self::relax_complex_calls_max_inclusive(ctx, inlined).map(Some);
            }
            Ok(callee.range.map(|range| range.max_inclusive(ctx)))
        })
    }

    /// Solve `value == fun(p_1, .., p_n)` for the parameters.
    ///
    /// Returns the value of each parameter keyed by its dimension. Succeeds
    /// when `value` is itself a call to `fun` (or to a function alpha-equal to
    /// it), or when `fun` has a single parameter and an affine body
    /// `a * p + b` with `a != 0`. Anything else is reported as
    /// [`NotInvertible`](crate::Error::NotInvertible).
    pub fn invert_call(ctx: &mut Context, value: ExprId, fun: FunId) -> Result<Vec<(DimId, ExprId)>> {
        let callee = ctx.fun(fun).clone();
        let not_invertible = |reason: &'static str| NotInvertibleSnafu { fname: callee.fname.clone(), reason };

        if let Expr::Call { fun: other, args, dims } = ctx.expr(value).clone() {
            let same = other == fun || Self::check_equality(ctx, fun, other).equals;
            if same {
                let mut solved = Vec::with_capacity(callee.arity());
                for dim in callee.dimensions() {
                    let pos = dims.iter().position(|d| d == dim).context(MissingDimensionArgumentSnafu {
                        fname: callee.fname.clone(),
                        dimension: ctx.dimension(*dim).name.clone(),
                    })?;
                    solved.push((*dim, args[pos]));
                }
                return Ok(solved);
            }
        }

        ensure!(callee.arity() > 0, not_invertible("function has no parameters"));
        ensure!(callee.arity() == 1, not_invertible("body depends on more than one parameter"));
        let body = callee.body.context(UndefinedBodySnafu { fname: callee.fname.clone() })?;
        ensure!(ctx.is_affine(body), not_invertible("body is not affine"));

        let param = callee.parameters[0];
        let mut analyzer = Analyzer::without_memoization();
        let body = analyzer.simplify(ctx, body);
        let form = LinearForm::of(ctx, body);
        let param_expr = ctx.var_expr(param);
        let coeff = form.terms.get(&param_expr).copied().unwrap_or(0);
        ensure!(form.terms.len() <= 1, not_invertible("body is not affine in its parameter"));
        ensure!(coeff != 0, not_invertible("body does not depend on its parameter"));

        let dtype = ctx.dtype(value).promote(ctx.dtype(param_expr));
        let offset = ctx.const_int(form.constant, dtype);
        let shifted = ctx.sub(value, offset);
        let solved = match coeff {
            1 => shifted,
            -1 => {
                let zero = ctx.zero(dtype);
                ctx.sub(zero, shifted)
            }
            c => {
                let divisor = ctx.const_int(c, dtype);
                let rem = ctx.floormod(shifted, divisor)?;
                let zero = ctx.zero(dtype);
                let in_image = ctx.eq(rem, zero);
                ensure!(analyzer.can_prove(ctx, in_image), not_invertible("value is not in the image of the body"));
                ctx.floordiv(shifted, divisor)?
            }
        };
        tracing::trace!(fname = %callee.fname, solved = %ctx.display(solved), "inverted call");
        Ok(vec![(callee.dimensions[0], analyzer.simplify(ctx, solved))])
    }

    /// Decide whether `f1` and `f2` are equal up to a consistent renaming of
    /// parameters.
    ///
    /// Parameters must correspond one to one and agree on their dimension.
    /// Parameters that the bodies never mention are paired positionally.
    pub fn check_equality(ctx: &Context, f1: FunId, f2: FunId) -> ArgMappingAndEquality {
        let (a, b) = (ctx.fun(f1), ctx.fun(f2));
        let unequal = ArgMappingAndEquality::default();
        if a.arity() != b.arity() {
            return unequal;
        }
        let (Some(body_a), Some(body_b)) = (a.body, b.body) else {
            return ArgMappingAndEquality { equals: f1 == f2, mapping: identity_mapping(a) };
        };

        let mut matcher = AlphaMatcher { ctx, lhs: a, rhs: b, fwd: HashMap::new(), bwd: HashMap::new() };
        if !matcher.matches(body_a, body_b) {
            return unequal;
        }
        let AlphaMatcher { mut fwd, mut bwd, .. } = matcher;

        let unused_a = a.parameters.iter().filter(|p| !fwd.contains_key(*p)).copied().collect::<Vec<_>>();
        let unused_b = b.parameters.iter().filter(|p| !bwd.contains_key(*p)).copied().collect::<Vec<_>>();
        if unused_a.len() != unused_b.len() {
            return unequal;
        }
        for (pa, pb) in unused_a.into_iter().zip(unused_b) {
            let (Some(ia), Some(ib)) = (a.arg_pos(pa), b.arg_pos(pb)) else {
                return unequal;
            };
            if a.dimensions[ia] != b.dimensions[ib] {
                return unequal;
            }
            fwd.insert(pa, pb);
            bwd.insert(pb, pa);
        }
        ArgMappingAndEquality { equals: true, mapping: fwd }
    }
}

fn identity_mapping(fun: &UninterpFun) -> HashMap<VarId, VarId> {
    fun.parameters.iter().map(|p| (*p, *p)).collect()
}

fn check_free_vars(ctx: &Context, fname: &str, parameters: &[VarId], body: ExprId) -> Result<()> {
    for var in ctx.free_vars(body) {
        ensure!(
            parameters.contains(&var),
            FreeVariableInBodySnafu { fname: fname.to_string(), var: ctx.var_name(var).to_string() }
        );
    }
    Ok(())
}

/// Structural matcher that builds a bijection between the parameters of two
/// functions while walking their bodies in lockstep.
struct AlphaMatcher<'a> {
    ctx: &'a Context,
    lhs: &'a UninterpFun,
    rhs: &'a UninterpFun,
    fwd: HashMap<VarId, VarId>,
    bwd: HashMap<VarId, VarId>,
}

impl AlphaMatcher<'_> {
    fn matches(&mut self, a: ExprId, b: ExprId) -> bool {
        let ctx = self.ctx;
        match (ctx.expr(a), ctx.expr(b)) {
            (Expr::Var(va), Expr::Var(vb)) => self.bind(*va, *vb),
            (Expr::Const { value: x, dtype: dx }, Expr::Const { value: y, dtype: dy }) => x == y && dx == dy,
            (Expr::Binary(oa, a0, a1), Expr::Binary(ob, b0, b1)) if oa == ob => {
                let (a0, a1, b0, b1) = (*a0, *a1, *b0, *b1);
                self.matches(a0, b0) && self.matches(a1, b1)
            }
            (Expr::Cmp(oa, a0, a1), Expr::Cmp(ob, b0, b1)) if oa == ob => {
                let (a0, a1, b0, b1) = (*a0, *a1, *b0, *b1);
                self.matches(a0, b0) && self.matches(a1, b1)
            }
            (Expr::And(a0, a1), Expr::And(b0, b1)) | (Expr::Or(a0, a1), Expr::Or(b0, b1)) => {
                let (a0, a1, b0, b1) = (*a0, *a1, *b0, *b1);
                self.matches(a0, b0) && self.matches(a1, b1)
            }
            (Expr::Not(x), Expr::Not(y)) => {
                let (x, y) = (*x, *y);
                self.matches(x, y)
            }
            (Expr::Call { fun: fa, args: aa, dims: da }, Expr::Call { fun: fb, args: ab, dims: db }) => {
                if fa != fb || da != db || aa.len() != ab.len() {
                    return false;
                }
                let pairs: Vec<(ExprId, ExprId)> = aa.iter().copied().zip(ab.iter().copied()).collect();
                pairs.into_iter().all(|(x, y)| self.matches(x, y))
            }
            _ => false,
        }
    }

    fn bind(&mut self, va: VarId, vb: VarId) -> bool {
        let (pa, pb) = (self.lhs.arg_pos(va), self.rhs.arg_pos(vb));
        match (pa, pb) {
            (Some(ia), Some(ib)) => {
                if self.lhs.dimensions[ia] != self.rhs.dimensions[ib] {
                    return false;
                }
                match (self.fwd.get(&va), self.bwd.get(&vb)) {
                    (Some(mapped), _) if *mapped != vb => false,
                    (_, Some(mapped)) if *mapped != va => false,
                    _ => {
                        self.fwd.insert(va, vb);
                        self.bwd.insert(vb, va);
                        true
                    }
                }
            }
            // Non-parameters only match themselves.
            (None, None) => va == vb,
            _ => false,
        }
    }
}
