//! Generators for property-based testing.
//!
//! Expressions live in a [`Context`], so strategies produce an
//! [`IndexRecipe`] tree that is materialized into a context afterwards.

use std::collections::HashMap;

use proptest::prelude::*;

use crate::context::Context;
use crate::expr::{ExprId, VarId};

/// Shape of an index expression over a fixed set of variables.
#[derive(Debug, Clone)]
pub enum IndexRecipe {
    Const(i64),
    Var(usize),
    Add(Box<IndexRecipe>, Box<IndexRecipe>),
    Sub(Box<IndexRecipe>, Box<IndexRecipe>),
    MulConst(Box<IndexRecipe>, i64),
    Div(Box<IndexRecipe>, i64),
    Mod(Box<IndexRecipe>, i64),
    Min(Box<IndexRecipe>, Box<IndexRecipe>),
    Max(Box<IndexRecipe>, Box<IndexRecipe>),
}

impl IndexRecipe {
    pub fn build(&self, ctx: &mut Context, vars: &[VarId]) -> ExprId {
        match self {
            IndexRecipe::Const(v) => ctx.int(*v),
            IndexRecipe::Var(i) => ctx.var_expr(vars[*i % vars.len()]),
            IndexRecipe::Add(a, b) => {
                let (a, b) = (a.build(ctx, vars), b.build(ctx, vars));
                ctx.add(a, b)
            }
            IndexRecipe::Sub(a, b) => {
                let (a, b) = (a.build(ctx, vars), b.build(ctx, vars));
                ctx.sub(a, b)
            }
            IndexRecipe::MulConst(a, c) => {
                let a = a.build(ctx, vars);
                ctx.mul_const(a, *c)
            }
            IndexRecipe::Div(a, c) => {
                let a = a.build(ctx, vars);
                let c = ctx.int(*c);
                ctx.floordiv(a, c).expect("generated divisors are positive")
            }
            IndexRecipe::Mod(a, c) => {
                let a = a.build(ctx, vars);
                let c = ctx.int(*c);
                ctx.floormod(a, c).expect("generated divisors are positive")
            }
            IndexRecipe::Min(a, b) => {
                let (a, b) = (a.build(ctx, vars), b.build(ctx, vars));
                ctx.min(a, b)
            }
            IndexRecipe::Max(a, b) => {
                let (a, b) = (a.build(ctx, vars), b.build(ctx, vars));
                ctx.max(a, b)
            }
        }
    }
}

/// Index expressions over `num_vars` variables with small constants and
/// positive divisors.
pub fn arb_index_recipe(num_vars: usize) -> impl Strategy<Value = IndexRecipe> {
    let leaf = prop_oneof![(-20i64..=20).prop_map(IndexRecipe::Const), (0..num_vars).prop_map(IndexRecipe::Var),];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| IndexRecipe::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| IndexRecipe::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), -4i64..=4).prop_map(|(a, c)| IndexRecipe::MulConst(Box::new(a), c)),
            (inner.clone(), 1i64..=8).prop_map(|(a, c)| IndexRecipe::Div(Box::new(a), c)),
            (inner.clone(), 1i64..=8).prop_map(|(a, c)| IndexRecipe::Mod(Box::new(a), c)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| IndexRecipe::Min(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| IndexRecipe::Max(Box::new(a), Box::new(b))),
        ]
    })
}

/// Assignment for `num_vars` variables, each in `[0, extent)`.
pub fn arb_assignment(num_vars: usize, extent: i64) -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(0..extent, num_vars)
}

/// Bind values to variables for [`Context::eval`].
pub fn env_of(vars: &[VarId], values: &[i64]) -> HashMap<VarId, i64> {
    vars.iter().copied().zip(values.iter().copied()).collect()
}
