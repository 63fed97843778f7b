//! Stage: the iteration-variable relation graph of one operation.
//!
//! Schedule primitives append relations in the order they are applied. A
//! primitive only ever consumes current leaves, so a child can never be
//! declared before its parent and a single forward (or backward) sweep over
//! [`Stage::relations`] visits every relation after its inputs are final.

use std::collections::BTreeMap;

use snafu::ensure;
use tracing::debug;

use tessera_ir::{Context, ExprId, IterVar, IterVarId, IterVarType};

use crate::error::*;
use crate::relation::{IterVarRelation, SplitFactor};

/// Per-variable scheduling attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterVarAttr {
    /// Thread axis this leaf is bound to.
    pub bind_thread: Option<IterVarId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    name: String,
    root_iter_vars: Vec<IterVarId>,
    all_iter_vars: Vec<IterVarId>,
    leaf_iter_vars: Vec<IterVarId>,
    relations: Vec<IterVarRelation>,
    iter_var_attrs: BTreeMap<IterVarId, IterVarAttr>,
}

impl Stage {
    /// Stage whose loop nest is initially `roots`, outermost first.
    pub fn new(name: impl Into<String>, roots: &[IterVarId]) -> Self {
        Self {
            name: name.into(),
            root_iter_vars: roots.to_vec(),
            all_iter_vars: roots.to_vec(),
            leaf_iter_vars: roots.to_vec(),
            relations: Vec::new(),
            iter_var_attrs: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relations in declaration (topological) order.
    pub fn relations(&self) -> &[IterVarRelation] {
        &self.relations
    }

    pub fn root_iter_vars(&self) -> &[IterVarId] {
        &self.root_iter_vars
    }

    pub fn all_iter_vars(&self) -> &[IterVarId] {
        &self.all_iter_vars
    }

    /// Current loop nest, outermost first.
    pub fn leaf_iter_vars(&self) -> &[IterVarId] {
        &self.leaf_iter_vars
    }

    pub fn iter_var_attrs(&self) -> &BTreeMap<IterVarId, IterVarAttr> {
        &self.iter_var_attrs
    }

    /// Thread axis `iv` is bound to, if any.
    pub fn bound_thread(&self, iv: IterVarId) -> Option<IterVarId> {
        self.iter_var_attrs.get(&iv).and_then(|attr| attr.bind_thread)
    }

    // =========================================================================
    // Schedule primitives
    // =========================================================================

    /// Split `parent` into `(outer, inner)` where `inner` has extent `factor`.
    pub fn split(&mut self, ctx: &mut Context, parent: IterVarId, factor: ExprId) -> Result<(IterVarId, IterVarId)> {
        self.split_with(ctx, parent, SplitFactor::Factor(factor))
    }

    /// Split `parent` into `(outer, inner)` where `outer` has extent `nparts`.
    pub fn split_by_nparts(
        &mut self,
        ctx: &mut Context,
        parent: IterVarId,
        nparts: ExprId,
    ) -> Result<(IterVarId, IterVarId)> {
        self.split_with(ctx, parent, SplitFactor::NParts(nparts))
    }

    fn split_with(
        &mut self,
        ctx: &mut Context,
        parent: IterVarId,
        factor: SplitFactor,
    ) -> Result<(IterVarId, IterVarId)> {
        let pos = self.leaf_position(ctx, parent)?;
        let (SplitFactor::Factor(value) | SplitFactor::NParts(value)) = factor;
        if let Some(c) = ctx.as_const(value) {
            ensure!(
                c > 0,
                InvalidSplitFactorSnafu { iter_var: ctx.iter_var_name(parent).to_string(), factor: c.to_string() }
            );
        }

        let iter_type = ctx.iter_var(parent).iter_type;
        let outer = derive_iter_var(ctx, parent, "outer", iter_type);
        let inner = derive_iter_var(ctx, parent, "inner", iter_type);

        self.leaf_iter_vars.splice(pos..=pos, [outer, inner]);
        self.all_iter_vars.extend([outer, inner]);
        self.relations.push(IterVarRelation::Split { parent, outer, inner, factor });
        debug!(
            stage = %self.name,
            parent = ctx.iter_var_name(parent),
            factor = %ctx.display(value),
            nparts = matches!(factor, SplitFactor::NParts(_)),
            "split"
        );
        Ok((outer, inner))
    }

    /// Fuse two adjacent leaves into one. `outer` must directly precede `inner`.
    pub fn fuse(&mut self, ctx: &mut Context, outer: IterVarId, inner: IterVarId) -> Result<IterVarId> {
        let pos_outer = self.leaf_position(ctx, outer)?;
        let pos_inner = self.leaf_position(ctx, inner)?;
        ensure!(
            pos_inner == pos_outer + 1,
            FuseNotAdjacentSnafu {
                outer: ctx.iter_var_name(outer).to_string(),
                inner: ctx.iter_var_name(inner).to_string(),
            }
        );

        let iter_type = ctx.iter_var(outer).iter_type.max(ctx.iter_var(inner).iter_type);
        let name = format!("{}.{}.fused", ctx.iter_var_name(outer), ctx.iter_var_name(inner));
        let dtype = ctx.var_data(ctx.iter_var(outer).var).dtype;
        let var = ctx.var(name, dtype);
        let fused = ctx.add_iter_var(IterVar { var, dom: None, iter_type, thread_tag: None });

        self.leaf_iter_vars.splice(pos_outer..=pos_inner, [fused]);
        self.all_iter_vars.push(fused);
        self.relations.push(IterVarRelation::Fuse { outer, inner, fused });
        debug!(stage = %self.name, fused = ctx.iter_var_name(fused), "fuse");
        Ok(fused)
    }

    /// Replace `parent` by a zero-based copy.
    pub fn rebase(&mut self, ctx: &mut Context, parent: IterVarId) -> Result<IterVarId> {
        let pos = self.leaf_position(ctx, parent)?;
        let iter_type = ctx.iter_var(parent).iter_type;
        let rebased = derive_iter_var(ctx, parent, "rb", iter_type);

        self.leaf_iter_vars[pos] = rebased;
        self.all_iter_vars.push(rebased);
        self.relations.push(IterVarRelation::Rebase { parent, rebased });
        debug!(stage = %self.name, parent = ctx.iter_var_name(parent), "rebase");
        Ok(rebased)
    }

    /// Pin the leaf `iv` to the single value 0.
    pub fn singleton(&mut self, ctx: &Context, iv: IterVarId) -> Result<()> {
        self.leaf_position(ctx, iv)?;
        self.relations.push(IterVarRelation::Singleton { iter: iv });
        debug!(stage = %self.name, iter = ctx.iter_var_name(iv), "singleton");
        Ok(())
    }

    /// Bind the leaf `iv` to `thread`. The thread axis receives the domain of
    /// `iv` during domain propagation.
    pub fn bind(&mut self, ctx: &Context, iv: IterVarId, thread: IterVarId) -> Result<()> {
        self.leaf_position(ctx, iv)?;
        self.iter_var_attrs.entry(iv).or_default().bind_thread = Some(thread);
        debug!(stage = %self.name, iter = ctx.iter_var_name(iv), thread = ctx.iter_var_name(thread), "bind");
        Ok(())
    }

    fn leaf_position(&self, ctx: &Context, iv: IterVarId) -> Result<usize> {
        self.leaf_iter_vars.iter().position(|leaf| *leaf == iv).ok_or_else(|| {
            NotALeafSnafu { stage: self.name.clone(), iter_var: ctx.iter_var_name(iv).to_string() }.build()
        })
    }
}

/// Fresh `"{parent}.{suffix}"` variable sharing the parent's dtype.
fn derive_iter_var(ctx: &mut Context, parent: IterVarId, suffix: &str, iter_type: IterVarType) -> IterVarId {
    let name = format!("{}.{suffix}", ctx.iter_var_name(parent));
    let dtype = ctx.var_data(ctx.iter_var(parent).var).dtype;
    let var = ctx.var(name, dtype);
    ctx.add_iter_var(IterVar { var, dom: None, iter_type, thread_tag: None })
}
