use std::collections::HashMap;

use tracing::{debug, trace};

use tessera_ir::{Analyzer, Context, ExprId, IntSet, IterVarId, UninterpFun, eval_set};

use super::{BoundCheckMap, DomainMap, ValueMap, fetch, require};
use crate::config::InferConfig;
use crate::error::*;
use crate::relation::IterVarRelation;
use crate::stage::Stage;

/// Mark every variable whose index may leave its domain, sweeping backward.
///
/// `state` must hold a flag for every leaf. A split parent needs a check
/// when a child does, or when the split does not provably tile the parent
/// exactly.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn pass_up_bound_check(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    stage: &Stage,
    dom_map: &DomainMap,
    state: &mut BoundCheckMap,
) -> Result<()> {
    const PASS: &str = "pass_up_bound_check";

    for rel in stage.relations().iter().rev() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
                let outer_flag = fetch(ctx, state, outer, PASS, "outer")?;
                let inner_flag = fetch(ctx, state, inner, PASS, "inner")?;
                let doms = (dom_map.get(&parent), dom_map.get(&outer), dom_map.get(&inner));
                let flag = match doms {
                    _ if outer_flag || inner_flag => true,
                    (Some(parent_dom), Some(outer_dom), Some(inner_dom)) => {
                        let tiled = ctx.mul(inner_dom.extent, outer_dom.extent);
                        let exact = ctx.eq(parent_dom.extent, tiled);
                        !analyzer.can_prove(ctx, exact)
                    }
                    _ => true,
                };
                trace!(parent = ctx.iter_var_name(parent), needs_check = flag, "split");
                state.insert(parent, flag);
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                let flag = fetch(ctx, state, fused, PASS, "fused")?;
                state.insert(outer, flag);
                state.insert(inner, flag);
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let flag = fetch(ctx, state, rebased, PASS, "rebased")?;
                state.insert(parent, flag);
            }
            IterVarRelation::Singleton { .. } => {}
        }
    }
    Ok(())
}

/// Build the guard predicates for accessing the stage's root domain through
/// `value_map`.
///
/// A predicate is only emitted when interval evaluation over `dom_map`
/// cannot show it always holds. Opaque variables and those in
/// `config.skip_iter` are never checked.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn make_bound_check(
    ctx: &mut Context,
    stage: &Stage,
    dom_map: &DomainMap,
    value_map: &ValueMap,
    config: &InferConfig,
) -> Result<Vec<ExprId>> {
    const PASS: &str = "make_bound_check";

    let mut analyzer = config.analyzer();
    let mut bound_state: BoundCheckMap = stage.leaf_iter_vars().iter().map(|&iv| (iv, false)).collect();
    pass_up_bound_check(ctx, &mut analyzer, stage, dom_map, &mut bound_state)?;

    let mut iset_dmap = HashMap::with_capacity(dom_map.len());
    for (&iv, &dom) in dom_map {
        let var = ctx.iter_var(iv).var;
        iset_dmap.insert(var, IntSet::range(ctx, dom));
        analyzer.bind(var, dom);
    }

    let mut preds = Vec::new();

    for &iv in stage.all_iter_vars() {
        if is_skipped(ctx, config, iv) || !bound_state.get(&iv).copied().unwrap_or(false) {
            continue;
        }
        let Some(dom) = require(ctx, dom_map, iv, config.allow_missing, PASS, "domain")? else {
            continue;
        };
        let Some(value) = require(ctx, value_map, iv, config.allow_missing, PASS, "value")? else {
            continue;
        };
        let offset = ctx.sub(value, dom.min);
        let vmax = eval_set(ctx, &mut analyzer, offset, &iset_dmap).max();
        if !provably_below(ctx, &mut analyzer, vmax, dom.extent) {
            let pred = ctx.lt(offset, dom.extent);
            preds.push(UninterpFun::inline_calls(ctx, pred, true)?);
            trace!(iter_var = ctx.iter_var_name(iv), "upper bound check");
        }
    }

    for &iv in stage.root_iter_vars() {
        if config.skip_ivar_domain || is_skipped(ctx, config, iv) {
            continue;
        }
        let Some(dom) = require(ctx, dom_map, iv, config.allow_missing, PASS, "root domain")? else {
            continue;
        };
        let Some(declared) = ctx.iter_var(iv).dom else {
            return UndeclaredDomainSnafu { iter_var: ctx.iter_var_name(iv).to_string() }.fail();
        };
        if declared == dom {
            continue;
        }
        let Some(value) = require(ctx, value_map, iv, config.allow_missing, PASS, "root value")? else {
            continue;
        };
        let offset = ctx.sub(value, declared.min);
        let set = eval_set(ctx, &mut analyzer, offset, &iset_dmap);
        let non_negative = match set.min() {
            Some(vmin) => {
                let zero = ctx.zero(ctx.dtype(vmin));
                let cond = ctx.ge(vmin, zero);
                analyzer.can_prove(ctx, cond)
            }
            None => false,
        };
        if !non_negative {
            let zero = ctx.zero(ctx.dtype(offset));
            preds.push(ctx.ge(offset, zero));
        }
        if !provably_below(ctx, &mut analyzer, set.max(), declared.extent) {
            let pred = ctx.lt(offset, declared.extent);
            preds.push(UninterpFun::inline_calls(ctx, pred, true)?);
        }
    }

    debug!(num_predicates = preds.len(), "bound checks built");
    Ok(preds)
}

fn is_skipped(ctx: &Context, config: &InferConfig, iv: IterVarId) -> bool {
    config.skip_iter.contains(&iv) || ctx.iter_var(iv).is_opaque()
}

fn provably_below(ctx: &mut Context, analyzer: &mut Analyzer, vmax: Option<ExprId>, extent: ExprId) -> bool {
    let Some(vmax) = vmax else {
        return false;
    };
    let cond = ctx.lt(vmax, extent);
    analyzer.can_prove(ctx, cond)
}
