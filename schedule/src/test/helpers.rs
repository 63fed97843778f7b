//! Builders and assertions shared by the schedule tests.

use std::collections::HashMap;

use tessera_ir::{Analyzer, Context, ExprId, IntSet, IterVarId, IterVarType, Range};

use crate::message_passing::DomainMap;
use crate::stage::Stage;

/// Root iteration variable over `[0, extent)`.
pub fn root(ctx: &mut Context, name: &str, extent: i64) -> IterVarId {
    root_with(ctx, name, 0, extent, IterVarType::DataPar)
}

pub fn root_with(ctx: &mut Context, name: &str, min: i64, extent: i64, iter_type: IterVarType) -> IterVarId {
    let dom = Range::literal(ctx, min, extent);
    ctx.iter_var_new(name, Some(dom), iter_type)
}

/// `i` over `[0, extent)` split by `factor`: `(stage, i, outer, inner)`.
pub fn split_stage(ctx: &mut Context, extent: i64, factor: i64) -> (Stage, IterVarId, IterVarId, IterVarId) {
    let i = root(ctx, "i", extent);
    let mut stage = Stage::new("s", &[i]);
    let factor = ctx.int(factor);
    let (outer, inner) = stage.split(ctx, i, factor).unwrap();
    (stage, i, outer, inner)
}

/// Domain map holding the declared domain of every root.
pub fn seeded_domains(ctx: &Context, stage: &Stage) -> DomainMap {
    stage.root_iter_vars().iter().map(|&iv| (iv, ctx.iter_var(iv).dom.unwrap())).collect()
}

/// Domain map after running domain propagation from the declared roots.
pub fn inferred_domains(ctx: &mut Context, stage: &Stage) -> DomainMap {
    let mut dom_map = seeded_domains(ctx, stage);
    crate::pass_down_domain(ctx, &mut Analyzer::new(), stage, &mut dom_map, false).unwrap();
    dom_map
}

/// `(min, extent)` of a literal range.
pub fn literal(ctx: &Context, r: Range) -> (i64, i64) {
    (ctx.as_const(r.min).unwrap(), ctx.as_const(r.extent).unwrap())
}

/// Literal endpoints of a bounded set.
pub fn endpoints(ctx: &Context, set: IntSet) -> (i64, i64) {
    (ctx.as_const(set.min().unwrap()).unwrap(), ctx.as_const(set.max().unwrap()).unwrap())
}

pub fn interval(ctx: &mut Context, lo: i64, hi: i64) -> IntSet {
    let (lo, hi) = (ctx.int(lo), ctx.int(hi));
    IntSet::interval(lo, hi)
}

/// Evaluate `e` with each iteration variable's loop variable fixed.
pub fn eval_at(ctx: &Context, e: ExprId, assignment: &[(IterVarId, i64)]) -> Option<i64> {
    let env: HashMap<_, _> = assignment.iter().map(|&(iv, value)| (ctx.iter_var(iv).var, value)).collect();
    ctx.eval(e, &env)
}
