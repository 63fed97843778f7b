use std::collections::HashMap;

use tracing::{debug, trace, warn};

use tessera_ir::{Analyzer, Context, ExprId, IntSet, IterVarId, eval_set};

use super::{DomainMap, SetMap, fetch, offset_by};
use crate::error::*;
use crate::relation::IterVarRelation;
use crate::stage::Stage;

const PASS: &str = "pass_up_domain";

/// Propagate value sets from children to parents, sweeping backward.
///
/// `set_map` must hold a set for every leaf. When a child's set is exactly
/// its inferred domain, the parent gets its own domain back unchanged.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn pass_up_domain(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    stage: &Stage,
    dom_map: &DomainMap,
    set_map: &mut SetMap,
) -> Result<()> {
    for rel in stage.relations().iter().rev() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
                let outer_set = fetch(ctx, set_map, outer, PASS, "outer")?;
                let inner_set = fetch(ctx, set_map, inner, PASS, "inner")?;
                let parent_set = split_up(ctx, analyzer, dom_map, (parent, outer, inner), outer_set, inner_set)?;
                set_map.insert(parent, parent_set);
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                let fused_set = fetch(ctx, set_map, fused, PASS, "fused")?;
                let (outer_set, inner_set) = fuse_up(ctx, analyzer, dom_map, (outer, inner, fused), fused_set)?;
                set_map.insert(outer, outer_set);
                set_map.insert(inner, inner_set);
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let rebased_set = fetch(ctx, set_map, rebased, PASS, "rebased")?;
                let parent_set = rebase_up(ctx, analyzer, dom_map, parent, rebased, rebased_set)?;
                set_map.insert(parent, parent_set);
            }
            IterVarRelation::Singleton { .. } => {}
        }
    }

    debug!(num_sets = set_map.len(), "sets passed up");
    Ok(())
}

fn split_up(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    dom_map: &DomainMap,
    (parent, outer, inner): (IterVarId, IterVarId, IterVarId),
    outer_set: IntSet,
    inner_set: IntSet,
) -> Result<IntSet> {
    let parent_dom = fetch(ctx, dom_map, parent, PASS, "parent domain")?;
    let outer_dom = fetch(ctx, dom_map, outer, PASS, "outer domain")?;
    let inner_dom = fetch(ctx, dom_map, inner, PASS, "inner domain")?;
    if outer_set.match_range(ctx, analyzer, outer_dom) && inner_set.match_range(ctx, analyzer, inner_dom) {
        return Ok(IntSet::range(ctx, parent_dom));
    }

    let outer_var = ctx.iter_var_expr(outer);
    let inner_var = ctx.iter_var_expr(inner);
    let scaled = ctx.mul(outer_var, inner_dom.extent);
    let recombined = ctx.add(scaled, inner_var);
    let recombined = offset_by(ctx, recombined, parent_dom.min);
    let sets = HashMap::from([(ctx.iter_var(outer).var, outer_set), (ctx.iter_var(inner).var, inner_set)]);
    Ok(eval_set(ctx, analyzer, recombined, &sets))
}

fn fuse_up(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    dom_map: &DomainMap,
    (outer, inner, fused): (IterVarId, IterVarId, IterVarId),
    fused_set: IntSet,
) -> Result<(IntSet, IntSet)> {
    let outer_dom = fetch(ctx, dom_map, outer, PASS, "outer domain")?;
    let inner_dom = fetch(ctx, dom_map, inner, PASS, "inner domain")?;
    let fused_dom = fetch(ctx, dom_map, fused, PASS, "fused domain")?;
    let full = |ctx: &mut Context| (IntSet::range(ctx, outer_dom), IntSet::range(ctx, inner_dom));

    if fused_set.match_range(ctx, analyzer, fused_dom) {
        return Ok(full(ctx));
    }
    let factor = inner_dom.extent;

    if let Some(point) = fused_set.point_value() {
        let outer_value = ctx.floordiv(point, factor)?;
        let outer_value = offset_by(ctx, outer_value, outer_dom.min);
        let inner_value = ctx.floormod(point, factor)?;
        let inner_value = offset_by(ctx, inner_value, inner_dom.min);
        return Ok((
            IntSet::single_point(analyzer.simplify(ctx, outer_value)),
            IntSet::single_point(analyzer.simplify(ctx, inner_value)),
        ));
    }

    let (Some(fused_min), Some(fused_max)) = (fused_set.min(), fused_set.max()) else {
        return Ok(full(ctx));
    };

    let outer_lo = ctx.floordiv(fused_min, factor)?;
    let outer_lo = offset_by(ctx, outer_lo, outer_dom.min);
    let outer_hi = ctx.floordiv(fused_max, factor)?;
    let outer_hi = offset_by(ctx, outer_hi, outer_dom.min);
    let outer_set = IntSet::interval(analyzer.simplify(ctx, outer_lo), analyzer.simplify(ctx, outer_hi));

    let span = ctx.sub(fused_max, fused_min);
    let span = ctx.add_const(span, 1);
    let span = analyzer.simplify(ctx, span);

    if divides(ctx, analyzer, factor, span)? && divides(ctx, analyzer, fused_min, span)? {
        let inner_lo = ctx.floormod(fused_min, factor)?;
        let inner_lo = offset_by(ctx, inner_lo, inner_dom.min);
        let inner_hi = ctx.floormod(fused_max, factor)?;
        let inner_hi = offset_by(ctx, inner_hi, inner_dom.min);
        let inner_set = IntSet::interval(analyzer.simplify(ctx, inner_lo), analyzer.simplify(ctx, inner_hi));
        trace!(fused = ctx.iter_var_name(fused), "fused set aligned with inner extent");
        return Ok((outer_set, inner_set));
    }

    // Falling back to the full inner domain over-approximates; it is never
    // tightened here.
    if !(divides(ctx, analyzer, span, factor)? && divides(ctx, analyzer, fused_min, factor)?) {
        warn!(
            fused = ctx.iter_var_name(fused),
            span = %ctx.display(span),
            factor = %ctx.display(factor),
            "fused and original axes are not aligned, this may cause redundant computations"
        );
    }
    Ok((outer_set, IntSet::range(ctx, inner_dom)))
}

fn rebase_up(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    dom_map: &DomainMap,
    parent: IterVarId,
    rebased: IterVarId,
    rebased_set: IntSet,
) -> Result<IntSet> {
    let parent_dom = fetch(ctx, dom_map, parent, PASS, "parent domain")?;
    let rebased_dom = fetch(ctx, dom_map, rebased, PASS, "rebased domain")?;
    if rebased_set.match_range(ctx, analyzer, rebased_dom) {
        return Ok(IntSet::range(ctx, parent_dom));
    }
    let rebased_var = ctx.iter_var_expr(rebased);
    let shifted = offset_by(ctx, rebased_var, parent_dom.min);
    let sets = HashMap::from([(ctx.iter_var(rebased).var, rebased_set)]);
    Ok(eval_set(ctx, analyzer, shifted, &sets))
}

/// Whether `divisor` provably divides `value`.
fn divides(ctx: &mut Context, analyzer: &mut Analyzer, value: ExprId, divisor: ExprId) -> Result<bool> {
    let rem = ctx.floormod(value, divisor)?;
    let rem = analyzer.simplify(ctx, rem);
    Ok(ctx.is_zero(rem))
}
