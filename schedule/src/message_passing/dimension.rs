use snafu::{OptionExt, ensure};
use tracing::{debug, trace};

use tessera_ir::{Analyzer, Context, Range, UninterpFun};

use super::{DimDomainMap, DimValueMap, PassKey, ceil_div, require, set_value, update};
use crate::dimension_graph::{ComputeOp, DimensionRelation};
use crate::error::*;
use crate::relation::SplitFactor;

/// Infer the domain of every derived dimension of `op`, sweeping forward.
///
/// For `Change`, each new dimension takes the declared domain of the loop
/// variable defining the old dimension, or `[0, 1)` when the old dimension
/// has unit extent.
#[tracing::instrument(skip_all, fields(op = %op.name))]
pub fn dimension_pass_down_domain(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    op: &ComputeOp,
    dom_map: &mut DimDomainMap,
    allow_missing: bool,
) -> Result<()> {
    const PASS: &str = "dimension_pass_down_domain";

    for rel in op.dim_relation_graph.relations() {
        match rel {
            &DimensionRelation::Split { parent, outer, inner, factor } => {
                let Some(range_parent) = require(ctx, dom_map, parent, allow_missing, PASS, "parent")? else {
                    continue;
                };
                let (fixed, derived, value) = match factor {
                    SplitFactor::Factor(value) => (inner, outer, value),
                    SplitFactor::NParts(value) => (outer, inner, value),
                };
                let fixed_range = Range::from_extent(ctx, value);
                update(ctx, analyzer, dom_map, fixed, fixed_range)?;
                let extent = ceil_div(ctx, analyzer, range_parent.extent, value)?;
                let derived_range = Range::from_extent(ctx, extent);
                update(ctx, analyzer, dom_map, derived, derived_range)?;
            }
            &DimensionRelation::Fuse { outer, inner, fused } => {
                let Some(range_outer) = require(ctx, dom_map, outer, allow_missing, PASS, "outer")? else {
                    continue;
                };
                let Some(range_inner) = require(ctx, dom_map, inner, allow_missing, PASS, "inner")? else {
                    continue;
                };
                let extent = ctx.mul(range_outer.extent, range_inner.extent);
                let extent = analyzer.simplify(ctx, extent);
                let fused_range = Range::from_extent(ctx, extent);
                update(ctx, analyzer, dom_map, fused, fused_range)?;
            }
            DimensionRelation::Change { old_dims, .. } => {
                for &old in old_dims {
                    let Some(old_range) = require(ctx, dom_map, old, allow_missing, PASS, "old")? else {
                        continue;
                    };
                    let entry = *op.dim_var_entry(ctx, old)?;
                    let new_range = if ctx.is_one(old_range.extent) {
                        Range::literal(ctx, 0, 1)
                    } else {
                        ctx.iter_var(entry.iv)
                            .dom
                            .context(UndeclaredDomainSnafu { iter_var: ctx.iter_var_name(entry.iv).to_string() })?
                    };
                    let dims = ctx.fun(entry.value_expr).dimensions().to_vec();
                    for dim in dims {
                        update(ctx, analyzer, dom_map, dim, new_range)?;
                    }
                }
            }
        }
    }

    debug!(num_domains = dom_map.len(), "dimension domains inferred");
    Ok(())
}

/// Derive the value of every dimension reachable from the known ones,
/// sweeping forward.
///
/// `Change` is resolved by inverting the function that defines each known
/// old dimension. A function that cannot be inverted fails the pass.
#[tracing::instrument(skip_all, fields(op = %op.name))]
pub fn dimension_pass_down_values(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    op: &ComputeOp,
    dom_map: &DimDomainMap,
    value_map: &mut DimValueMap,
    allow_missing: bool,
) -> Result<()> {
    const PASS: &str = "dimension_pass_down_values";

    for rel in op.dim_relation_graph.relations() {
        match rel {
            &DimensionRelation::Split { parent, outer, inner, .. } => {
                let Some(parent_value) = require(ctx, value_map, parent, allow_missing, PASS, "parent")? else {
                    continue;
                };
                let Some(inner_dom) = require(ctx, dom_map, inner, allow_missing, PASS, "inner domain")? else {
                    continue;
                };
                ensure!(
                    ctx.is_zero(inner_dom.min),
                    NonZeroMinSnafu {
                        pass: PASS,
                        iter_var: inner.describe(ctx),
                        min: ctx.display(inner_dom.min).to_string(),
                    }
                );
                let outer_value = ctx.floordiv(parent_value, inner_dom.extent)?;
                let inner_value = ctx.floormod(parent_value, inner_dom.extent)?;
                set_value(ctx, analyzer, value_map, outer, outer_value)?;
                set_value(ctx, analyzer, value_map, inner, inner_value)?;
            }
            &DimensionRelation::Fuse { outer, inner, fused } => {
                let Some(outer_value) = require(ctx, value_map, outer, allow_missing, PASS, "outer")? else {
                    continue;
                };
                let Some(inner_value) = require(ctx, value_map, inner, allow_missing, PASS, "inner")? else {
                    continue;
                };
                let Some(inner_dom) = require(ctx, dom_map, inner, allow_missing, PASS, "inner domain")? else {
                    continue;
                };
                let scaled = ctx.mul(outer_value, inner_dom.extent);
                let value = ctx.add(scaled, inner_value);
                set_value(ctx, analyzer, value_map, fused, value)?;
            }
            DimensionRelation::Change { old_dims, new_dims } => {
                for &old in old_dims {
                    if new_dims.contains(&old) {
                        continue;
                    }
                    let Some(old_value) = require(ctx, value_map, old, allow_missing, PASS, "old")? else {
                        continue;
                    };
                    let entry = *op.dim_var_entry(ctx, old)?;
                    for (dim, value) in UninterpFun::invert_call(ctx, old_value, entry.value_expr)? {
                        trace!(from = %old.describe(ctx), to = %dim.describe(ctx), value = %ctx.display(value), "inverted");
                        set_value(ctx, analyzer, value_map, dim, value)?;
                    }
                }
            }
        }
    }

    debug!(num_values = value_map.len(), "dimension values passed down");
    Ok(())
}
