use snafu::ensure;
use tracing::{debug, trace};

use tessera_ir::{Analyzer, Context};

use super::{DomainMap, ValueMap, offset_by, require, set_value};
use crate::error::*;
use crate::relation::IterVarRelation;
use crate::stage::Stage;

/// Derive parent index expressions from child values, sweeping the
/// relations backward.
///
/// Typical use seeds `value_map` with the leaf loop variables, which yields
/// every root index in terms of the loop nest.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn pass_up_index(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    stage: &Stage,
    dom_map: &DomainMap,
    value_map: &mut ValueMap,
    allow_missing: bool,
) -> Result<()> {
    const PASS: &str = "pass_up_index";

    for rel in stage.relations().iter().rev() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
                let Some(outer_value) = require(ctx, value_map, outer, allow_missing, PASS, "outer")? else {
                    continue;
                };
                let Some(inner_value) = require(ctx, value_map, inner, allow_missing, PASS, "inner")? else {
                    continue;
                };
                let Some(inner_dom) = require(ctx, dom_map, inner, allow_missing, PASS, "inner domain")? else {
                    continue;
                };
                let Some(parent_dom) = require(ctx, dom_map, parent, allow_missing, PASS, "parent domain")? else {
                    continue;
                };
                let scaled = ctx.mul(outer_value, inner_dom.extent);
                let value = ctx.add(scaled, inner_value);
                let value = offset_by(ctx, value, parent_dom.min);
                trace!(parent = ctx.iter_var_name(parent), value = %ctx.display(value), "split");
                set_value(ctx, analyzer, value_map, parent, value)?;
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                let Some(fused_value) = require(ctx, value_map, fused, allow_missing, PASS, "fused")? else {
                    continue;
                };
                let Some(outer_dom) = require(ctx, dom_map, outer, allow_missing, PASS, "outer domain")? else {
                    continue;
                };
                let Some(inner_dom) = require(ctx, dom_map, inner, allow_missing, PASS, "inner domain")? else {
                    continue;
                };
                let factor = inner_dom.extent;
                let quotient = ctx.floordiv(fused_value, factor)?;
                let outer_value = offset_by(ctx, quotient, outer_dom.min);
                let remainder = ctx.floormod(fused_value, factor)?;
                let inner_value = offset_by(ctx, remainder, inner_dom.min);
                set_value(ctx, analyzer, value_map, outer, outer_value)?;
                set_value(ctx, analyzer, value_map, inner, inner_value)?;
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let Some(rebased_value) = require(ctx, value_map, rebased, allow_missing, PASS, "rebased")? else {
                    continue;
                };
                let Some(parent_dom) = require(ctx, dom_map, parent, allow_missing, PASS, "parent domain")? else {
                    continue;
                };
                let value = offset_by(ctx, rebased_value, parent_dom.min);
                set_value(ctx, analyzer, value_map, parent, value)?;
            }
            IterVarRelation::Singleton { .. } => {}
        }
    }

    debug!(num_values = value_map.len(), "indices passed up");
    Ok(())
}

/// Derive child index expressions from parent values, sweeping the
/// relations forward.
///
/// Split and fuse decompose with the inner extent, so the inner variables
/// (and for fuse the outer one) must be zero-based.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn pass_down_index(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    stage: &Stage,
    dom_map: &DomainMap,
    value_map: &mut ValueMap,
    allow_missing: bool,
) -> Result<()> {
    const PASS: &str = "pass_down_index";

    for rel in stage.relations() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
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
                        iter_var: ctx.iter_var_name(inner).to_string(),
                        min: ctx.display(inner_dom.min).to_string(),
                    }
                );
                let factor = inner_dom.extent;
                let outer_value = ctx.floordiv(parent_value, factor)?;
                let inner_value = ctx.floormod(parent_value, factor)?;
                set_value(ctx, analyzer, value_map, outer, outer_value)?;
                set_value(ctx, analyzer, value_map, inner, inner_value)?;
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                let Some(outer_value) = require(ctx, value_map, outer, allow_missing, PASS, "outer")? else {
                    continue;
                };
                let Some(inner_value) = require(ctx, value_map, inner, allow_missing, PASS, "inner")? else {
                    continue;
                };
                let Some(outer_dom) = require(ctx, dom_map, outer, allow_missing, PASS, "outer domain")? else {
                    continue;
                };
                let Some(inner_dom) = require(ctx, dom_map, inner, allow_missing, PASS, "inner domain")? else {
                    continue;
                };
                for (iv, min) in [(outer, outer_dom.min), (inner, inner_dom.min)] {
                    ensure!(
                        ctx.is_zero(min),
                        NonZeroMinSnafu {
                            pass: PASS,
                            iter_var: ctx.iter_var_name(iv).to_string(),
                            min: ctx.display(min).to_string(),
                        }
                    );
                }
                let scaled = ctx.mul(outer_value, inner_dom.extent);
                let value = ctx.add(scaled, inner_value);
                set_value(ctx, analyzer, value_map, fused, value)?;
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let Some(parent_value) = require(ctx, value_map, parent, allow_missing, PASS, "parent")? else {
                    continue;
                };
                let Some(parent_dom) = require(ctx, dom_map, parent, allow_missing, PASS, "parent domain")? else {
                    continue;
                };
                ensure!(
                    ctx.is_zero(parent_dom.min),
                    NonZeroMinSnafu {
                        pass: PASS,
                        iter_var: ctx.iter_var_name(parent).to_string(),
                        min: ctx.display(parent_dom.min).to_string(),
                    }
                );
                set_value(ctx, analyzer, value_map, rebased, parent_value)?;
            }
            IterVarRelation::Singleton { iter } => {
                let dtype = ctx.var_data(ctx.iter_var(iter).var).dtype;
                // A singleton is pinned, whatever the variable was seeded with.
                value_map.insert(iter, ctx.zero(dtype));
            }
        }
    }

    debug!(num_values = value_map.len(), "indices passed down");
    Ok(())
}
