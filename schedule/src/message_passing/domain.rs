use tracing::debug;

use tessera_ir::{Analyzer, Context, Range};

use super::{DomainMap, ceil_div, require, update};
use crate::error::*;
use crate::relation::{IterVarRelation, SplitFactor};
use crate::stage::Stage;

const PASS: &str = "pass_down_domain";

/// Infer the domain of every derived variable from its parents.
///
/// `dom_map` must hold the root domains. Thread axes receive the
/// domain of the variable they are bound to.
#[tracing::instrument(skip_all, fields(stage = stage.name()))]
pub fn pass_down_domain(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    stage: &Stage,
    dom_map: &mut DomainMap,
    allow_missing: bool,
) -> Result<()> {
    for rel in stage.relations() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, factor } => {
                let Some(range_parent) = require(ctx, dom_map, parent, allow_missing, PASS, "parent")? else {
                    continue;
                };
                match factor {
                    SplitFactor::Factor(factor) => {
                        let inner_range = Range::from_extent(ctx, factor);
                        update(ctx, analyzer, dom_map, inner, inner_range)?;
                        let nparts = ceil_div(ctx, analyzer, range_parent.extent, factor)?;
                        let outer_range = Range::from_extent(ctx, nparts);
                        update(ctx, analyzer, dom_map, outer, outer_range)?;
                    }
                    SplitFactor::NParts(nparts) => {
                        let outer_range = Range::from_extent(ctx, nparts);
                        update(ctx, analyzer, dom_map, outer, outer_range)?;
                        let factor = ceil_div(ctx, analyzer, range_parent.extent, nparts)?;
                        let inner_range = Range::from_extent(ctx, factor);
                        update(ctx, analyzer, dom_map, inner, inner_range)?;
                    }
                }
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
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
            IterVarRelation::Rebase { parent, rebased } => {
                let Some(range_parent) = require(ctx, dom_map, parent, allow_missing, PASS, "parent")? else {
                    continue;
                };
                let rebased_range = Range::from_extent(ctx, range_parent.extent);
                update(ctx, analyzer, dom_map, rebased, rebased_range)?;
            }
            IterVarRelation::Singleton { iter } => {
                let unit = Range::literal(ctx, 0, 1);
                update(ctx, analyzer, dom_map, iter, unit)?;
            }
        }
    }

    for (&iv, attr) in stage.iter_var_attrs() {
        let Some(thread) = attr.bind_thread else {
            continue;
        };
        let Some(range) = require(ctx, dom_map, iv, allow_missing, PASS, "bound")? else {
            continue;
        };
        update(ctx, analyzer, dom_map, thread, range)?;
    }

    debug!(num_domains = dom_map.len(), "domains inferred");
    Ok(())
}
