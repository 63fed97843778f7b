//! Per-invocation bound inference for one stage.

use snafu::OptionExt;
use tracing::debug;

use tessera_ir::{Context, ExprId};

use crate::config::InferConfig;
use crate::error::*;
use crate::message_passing::{DomainMap, ValueMap, make_bound_check, pass_down_domain, pass_up_index};
use crate::stage::Stage;

/// Everything code generation needs to emit a stage's loop nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageBounds {
    /// Domain of every iteration variable, including bound thread axes.
    pub dom_map: DomainMap,
    /// Index of every variable in terms of the leaf loop variables.
    pub value_map: ValueMap,
    /// Guards to conjoin around accesses through `value_map`.
    pub predicates: Vec<ExprId>,
}

/// Infer bounds for `stage` from the declared domains of its roots.
pub fn infer_stage_bounds(ctx: &mut Context, stage: &Stage, config: &InferConfig) -> Result<StageBounds> {
    let mut dom_map = DomainMap::with_capacity(stage.all_iter_vars().len());
    for &root in stage.root_iter_vars() {
        let dom = ctx.iter_var(root).dom.context(UndeclaredDomainSnafu { iter_var: ctx.iter_var_name(root) })?;
        dom_map.insert(root, dom);
    }
    infer_stage_bounds_with_roots(ctx, stage, dom_map, config)
}

/// Infer bounds for `stage` with the root domains given in `dom_map`.
///
/// Roots whose working domain differs from the declared one get both a
/// lower and an upper guard.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn infer_stage_bounds_with_roots(
    ctx: &mut Context,
    stage: &Stage,
    mut dom_map: DomainMap,
    config: &InferConfig,
) -> Result<StageBounds> {
    let mut analyzer = config.analyzer();
    for (&iv, &dom) in &dom_map {
        analyzer.bind(ctx.iter_var(iv).var, dom);
    }
    pass_down_domain(ctx, &mut analyzer, stage, &mut dom_map, config.allow_missing)?;

    let mut value_map = ValueMap::with_capacity(dom_map.len());
    for &leaf in stage.leaf_iter_vars() {
        let var = ctx.iter_var_expr(leaf);
        let value = match dom_map.get(&leaf) {
            Some(dom) if !ctx.is_zero(dom.min) => ctx.add(var, dom.min),
            _ => var,
        };
        value_map.insert(leaf, value);
    }
    pass_up_index(ctx, &mut analyzer, stage, &dom_map, &mut value_map, config.allow_missing)?;

    let predicates = make_bound_check(ctx, stage, &dom_map, &value_map, config)?;
    debug!(
        num_domains = dom_map.len(),
        num_values = value_map.len(),
        num_predicates = predicates.len(),
        "stage bounds inferred"
    );
    Ok(StageBounds { dom_map, value_map, predicates })
}
