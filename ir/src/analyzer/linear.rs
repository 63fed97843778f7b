//! Linear (affine) normal form used by the simplifier.
//!
//! A [`LinearForm`] is `sum(coeff_i * atom_i) + constant`, where atoms are
//! already-simplified non-linear sub-expressions (variables, calls, divisions,
//! products of non-constants). Terms are keyed by atom id, so two forms built
//! from the same atoms always render to the same expression.

use std::collections::BTreeMap;

use crate::context::Context;
use crate::expr::{Expr, ExprId};
use crate::types::{BinaryOp, DType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinearForm {
    pub terms: BTreeMap<ExprId, i64>,
    pub constant: i64,
}

impl LinearForm {
    pub fn constant(value: i64) -> Self {
        Self { terms: BTreeMap::new(), constant: value }
    }

    pub fn atom(id: ExprId) -> Self {
        Self { terms: BTreeMap::from([(id, 1)]), constant: 0 }
    }

    pub fn as_const(&self) -> Option<i64> {
        self.terms.is_empty().then_some(self.constant)
    }

    /// Decompose an already-simplified expression.
    pub fn of(ctx: &Context, id: ExprId) -> Self {
        match ctx.expr(id) {
            Expr::Const { value, .. } => Self::constant(*value),
            Expr::Binary(op @ (BinaryOp::Add | BinaryOp::Sub), a, b) => {
                let (a, b) = (Self::of(ctx, *a), Self::of(ctx, *b));
                let combined = if *op == BinaryOp::Add { a.checked_add(&b) } else { a.checked_sub(&b) };
                combined.unwrap_or_else(|| Self::atom(id))
            }
            Expr::Binary(BinaryOp::Mul, a, b) => {
                let scaled = match (ctx.as_const(*a), ctx.as_const(*b)) {
                    (_, Some(c)) => Self::of(ctx, *a).checked_scale(c),
                    (Some(c), _) => Self::of(ctx, *b).checked_scale(c),
                    _ => None,
                };
                scaled.unwrap_or_else(|| Self::atom(id))
            }
            _ => Self::atom(id),
        }
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut terms = self.terms.clone();
        for (&atom, &coeff) in &other.terms {
            let entry = terms.entry(atom).or_insert(0);
            *entry = entry.checked_add(coeff)?;
            if *entry == 0 {
                terms.remove(&atom);
            }
        }
        Some(Self { terms, constant: self.constant.checked_add(other.constant)? })
    }

    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.checked_add(&other.checked_scale(-1)?)
    }

    pub fn checked_scale(&self, factor: i64) -> Option<Self> {
        if factor == 0 {
            return Some(Self::constant(0));
        }
        let mut terms = BTreeMap::new();
        for (&atom, &coeff) in &self.terms {
            terms.insert(atom, coeff.checked_mul(factor)?);
        }
        Some(Self { terms, constant: self.constant.checked_mul(factor)? })
    }

    /// Split into `(quotient, remainder)` with respect to a positive divisor:
    /// `self == divisor * quotient + remainder`, where the quotient collects
    /// every term whose coefficient is a multiple of `divisor` and the
    /// remainder constant lies in `[0, divisor)`.
    pub fn split_by(&self, divisor: i64) -> (Self, Self) {
        debug_assert!(divisor > 0);
        let mut quotient = Self::constant(self.constant.div_euclid(divisor));
        let mut remainder = Self::constant(self.constant.rem_euclid(divisor));
        for (&atom, &coeff) in &self.terms {
            if coeff % divisor == 0 {
                quotient.terms.insert(atom, coeff / divisor);
            } else {
                remainder.terms.insert(atom, coeff);
            }
        }
        (quotient, remainder)
    }

    /// Render back to an expression. Positive terms come first so that
    /// `x - y` prints as a subtraction rather than `x + (y * -1)`.
    pub fn to_expr(&self, ctx: &mut Context, dtype: DType) -> ExprId {
        let mut acc: Option<ExprId> = None;
        let positive = self.terms.iter().filter(|(_, c)| **c > 0);
        let negative = self.terms.iter().filter(|(_, c)| **c < 0);
        for (&atom, &coeff) in positive {
            let term = if coeff == 1 { atom } else { ctx.mul_const(atom, coeff) };
            acc = Some(match acc {
                Some(lhs) => ctx.add(lhs, term),
                None => term,
            });
        }
        for (&atom, &coeff) in negative {
            let magnitude = coeff.checked_neg();
            acc = Some(match (acc, magnitude) {
                (Some(lhs), Some(1)) => ctx.sub(lhs, atom),
                (Some(lhs), Some(m)) => {
                    let term = ctx.mul_const(atom, m);
                    ctx.sub(lhs, term)
                }
                (lhs, _) => {
                    let term = ctx.mul_const(atom, coeff);
                    match lhs {
                        Some(lhs) => ctx.add(lhs, term),
                        None => term,
                    }
                }
            });
        }
        match acc {
            None => ctx.const_int(self.constant, dtype),
            Some(lhs) if self.constant > 0 => ctx.add_const(lhs, self.constant),
            Some(lhs) if self.constant < 0 => match self.constant.checked_neg() {
                Some(m) => {
                    let rhs = ctx.const_int(m, ctx.dtype(lhs));
                    ctx.sub(lhs, rhs)
                }
                None => ctx.add_const(lhs, self.constant),
            },
            Some(lhs) => lhs,
        }
    }
}
