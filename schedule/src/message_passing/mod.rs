//! Message passing over relation graphs.
//!
//! Each pass sweeps a [`Stage`](crate::Stage)'s relations once, forward
//! (`pass_down_*`, parent to child) or backward (`pass_up_*`, child to
//! parent), and fills a per-invocation map keyed by iteration variable (or
//! by dimension for the `dimension_*` passes).
//!
//! # Write-once maps
//!
//! Domain and index maps are written at most once per key. A second write
//! is a consistency check: the analyzer must prove the new entry equal to
//! the existing one, otherwise the schedule is inconsistent and the pass
//! fails. Bit masks and set maps are lattices and are joined instead.
//!
//! # Partial input
//!
//! With `allow_missing`, a relation whose inputs are absent is skipped.
//! Without it the pass fails with [`Error::MissingEntry`].

mod bit_mask;
mod bound_check;
mod dimension;
mod domain;
mod index;
mod set;

use std::collections::HashMap;
use std::hash::Hash;

use snafu::{OptionExt, ensure};
use tracing::trace;

use tessera_ir::{Analyzer, Context, DimId, ExprId, IntSet, IterVarId, Range, UninterpFun};

use crate::error::*;

pub use bit_mask::{pass_down_bit_mask_or, pass_up_bit_mask_or};
pub use bound_check::{make_bound_check, pass_up_bound_check};
pub use dimension::{dimension_pass_down_domain, dimension_pass_down_values};
pub use domain::pass_down_domain;
pub use index::{pass_down_index, pass_up_index};
pub use set::pass_up_domain;

pub type DomainMap = HashMap<IterVarId, Range>;
pub type ValueMap = HashMap<IterVarId, ExprId>;
pub type SetMap = HashMap<IterVarId, IntSet>;
pub type BitMaskMap = HashMap<IterVarId, u32>;
pub type BoundCheckMap = HashMap<IterVarId, bool>;
pub type DimDomainMap = HashMap<DimId, Range>;
pub type DimValueMap = HashMap<DimId, ExprId>;

/// Key of a propagation map.
pub trait PassKey: Copy + Eq + Hash {
    fn describe(self, ctx: &Context) -> String;

    /// Make a freshly inferred domain visible to the analyzer.
    fn bind(self, ctx: &Context, analyzer: &mut Analyzer, range: Range);
}

impl PassKey for IterVarId {
    fn describe(self, ctx: &Context) -> String {
        ctx.iter_var_name(self).to_string()
    }

    fn bind(self, ctx: &Context, analyzer: &mut Analyzer, range: Range) {
        analyzer.bind(ctx.iter_var(self).var, range);
    }
}

impl PassKey for DimId {
    fn describe(self, ctx: &Context) -> String {
        ctx.dimension(self).name.clone()
    }

    // Dimensions have no loop variable of their own.
    fn bind(self, _ctx: &Context, _analyzer: &mut Analyzer, _range: Range) {}
}

/// Record `range` as the domain of `key`.
///
/// The first write inserts and binds the key's variable in the analyzer.
/// Later writes must be zero-based with an extent provably equal to the
/// existing one.
pub fn update<K: PassKey>(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    dom_map: &mut HashMap<K, Range>,
    key: K,
    range: Range,
) -> Result<()> {
    let Some(&existing) = dom_map.get(&key) else {
        trace!(key = %key.describe(ctx), range = %range.display(ctx), "domain inferred");
        dom_map.insert(key, range);
        key.bind(ctx, analyzer, range);
        return Ok(());
    };
    if existing == range {
        return Ok(());
    }

    let diff = ctx.sub(range.extent, existing.extent);
    let diff = UninterpFun::inline_calls(ctx, diff, false)?;
    let zero = ctx.zero(ctx.dtype(diff));
    let same_extent = ctx.eq(diff, zero);
    ensure!(
        ctx.is_zero(existing.min) && analyzer.can_prove(ctx, same_extent),
        InconsistentDomainSnafu {
            iter_var: key.describe(ctx),
            existing: existing.display(ctx),
            new: range.display(ctx),
        }
    );
    Ok(())
}

/// Record `value` as the index of `key`, or check it against the existing one.
pub fn set_value<K: PassKey>(
    ctx: &mut Context,
    analyzer: &mut Analyzer,
    value_map: &mut HashMap<K, ExprId>,
    key: K,
    value: ExprId,
) -> Result<()> {
    let Some(&existing) = value_map.get(&key) else {
        value_map.insert(key, value);
        return Ok(());
    };
    ensure!(
        analyzer.can_prove_equal(ctx, existing, value),
        InconsistentValueSnafu {
            iter_var: key.describe(ctx),
            existing: ctx.display(existing).to_string(),
            new: ctx.display(value).to_string(),
        }
    );
    Ok(())
}

/// Look up a relation input that must be present.
pub(crate) fn fetch<K: PassKey, V: Copy>(
    ctx: &Context,
    map: &HashMap<K, V>,
    key: K,
    pass: &'static str,
    role: &'static str,
) -> Result<V> {
    map.get(&key).copied().context(MissingEntrySnafu { pass, role, iter_var: key.describe(ctx) })
}

/// Look up a relation input.
///
/// `Ok(None)` means the entry is absent and `allow_missing` is set, so the
/// caller should skip the relation.
pub(crate) fn require<K: PassKey, V: Copy>(
    ctx: &Context,
    map: &HashMap<K, V>,
    key: K,
    allow_missing: bool,
    pass: &'static str,
    role: &'static str,
) -> Result<Option<V>> {
    match map.get(&key) {
        Some(value) => Ok(Some(*value)),
        None if allow_missing => {
            trace!(pass, role, key = %key.describe(ctx), "skipping relation with missing input");
            Ok(None)
        }
        None => MissingEntrySnafu { pass, role, iter_var: key.describe(ctx) }.fail(),
    }
}

/// `ceil(a / b)`, or the exact quotient when `b` provably divides `a`.
pub(crate) fn ceil_div(ctx: &mut Context, analyzer: &mut Analyzer, a: ExprId, b: ExprId) -> Result<ExprId> {
    let rem = ctx.floormod(a, b)?;
    let zero = ctx.zero(ctx.dtype(rem));
    let divisible = ctx.eq(rem, zero);
    let quotient = if analyzer.can_prove(ctx, divisible) {
        ctx.floordiv(a, b)?
    } else {
        let sum = ctx.add(a, b);
        let bumped = ctx.add_const(sum, -1);
        ctx.floordiv(bumped, b)?
    };
    Ok(analyzer.simplify(ctx, quotient))
}

/// `value + min`, skipping a literal zero min.
pub(crate) fn offset_by(ctx: &mut Context, value: ExprId, min: ExprId) -> ExprId {
    if ctx.is_zero(min) { value } else { ctx.add(value, min) }
}
