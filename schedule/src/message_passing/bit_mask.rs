use snafu::ensure;
use tracing::trace;

use tessera_ir::Context;

use super::{BitMaskMap, PassKey};
use crate::error::*;
use crate::relation::IterVarRelation;
use crate::stage::Stage;

/// OR every child's flags into its parents, sweeping backward.
pub fn pass_up_bit_mask_or(ctx: &Context, stage: &Stage, state: &mut BitMaskMap, allow_missing: bool) -> Result<()> {
    const PASS: &str = "pass_up_bit_mask_or";

    for rel in stage.relations().iter().rev() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
                if !state.contains_key(&outer) && !state.contains_key(&inner) {
                    ensure!(
                        allow_missing,
                        MissingEntrySnafu { pass: PASS, role: "outer or inner", iter_var: parent.describe(ctx) }
                    );
                    continue;
                }
                let mut mask = state.get(&parent).copied().unwrap_or(0);
                mask |= state.get(&outer).copied().unwrap_or(0);
                mask |= state.get(&inner).copied().unwrap_or(0);
                state.insert(parent, mask);
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                let Some(&mask) = state.get(&fused) else {
                    ensure!(allow_missing, MissingEntrySnafu { pass: PASS, role: "fused", iter_var: fused.describe(ctx) });
                    continue;
                };
                *state.entry(outer).or_default() |= mask;
                *state.entry(inner).or_default() |= mask;
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let Some(&mask) = state.get(&rebased) else {
                    ensure!(
                        allow_missing,
                        MissingEntrySnafu { pass: PASS, role: "rebased", iter_var: rebased.describe(ctx) }
                    );
                    continue;
                };
                *state.entry(parent).or_default() |= mask;
            }
            IterVarRelation::Singleton { .. } => {}
        }
    }

    trace!(num_masks = state.len(), "bit masks passed up");
    Ok(())
}

/// OR every parent's flags into its children, sweeping forward.
pub fn pass_down_bit_mask_or(ctx: &Context, stage: &Stage, state: &mut BitMaskMap, allow_missing: bool) -> Result<()> {
    const PASS: &str = "pass_down_bit_mask_or";

    for rel in stage.relations() {
        match *rel {
            IterVarRelation::Split { parent, outer, inner, .. } => {
                let Some(&mask) = state.get(&parent) else {
                    ensure!(allow_missing, MissingEntrySnafu { pass: PASS, role: "parent", iter_var: parent.describe(ctx) });
                    continue;
                };
                *state.entry(outer).or_default() |= mask;
                *state.entry(inner).or_default() |= mask;
            }
            IterVarRelation::Fuse { outer, inner, fused } => {
                if !state.contains_key(&outer) && !state.contains_key(&inner) {
                    ensure!(
                        allow_missing,
                        MissingEntrySnafu { pass: PASS, role: "outer or inner", iter_var: fused.describe(ctx) }
                    );
                    continue;
                }
                let mask = state.get(&outer).copied().unwrap_or(0) | state.get(&inner).copied().unwrap_or(0);
                *state.entry(fused).or_default() |= mask;
            }
            IterVarRelation::Rebase { parent, rebased } => {
                let Some(&mask) = state.get(&parent) else {
                    ensure!(allow_missing, MissingEntrySnafu { pass: PASS, role: "parent", iter_var: parent.describe(ctx) });
                    continue;
                };
                *state.entry(rebased).or_default() |= mask;
            }
            // Flags are never cleared, so a singleton only gets an empty mask.
            IterVarRelation::Singleton { iter } => {
                state.entry(iter).or_insert(0);
            }
        }
    }

    trace!(num_masks = state.len(), "bit masks passed down");
    Ok(())
}
