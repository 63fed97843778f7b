//! Unit tests for simplification, constant bounds and proofs.

use test_case::test_case;

use crate::analyzer::{ConstIntBound, NEG_INF, POS_INF};
use crate::types::DType;
use crate::{Analyzer, Context, ExprId, Range, VarId};

/// Context with `x` in `[0, extent)`.
fn bound_var(extent: i64) -> (Context, Analyzer, VarId, ExprId) {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (x, xe) = ctx.fresh_var("x", DType::Int32);
    let range = Range::literal(&mut ctx, 0, extent);
    analyzer.bind(x, range);
    (ctx, analyzer, x, xe)
}

// ============================================================================
// Linear canonicalization
// ============================================================================

#[test]
fn test_addition_is_canonical_up_to_commutativity() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let (_, y) = ctx.fresh_var("y", DType::Int32);
    let xy = ctx.add(x, y);
    let yx = ctx.add(y, x);

    assert_ne!(xy, yx);
    assert_eq!(analyzer.simplify(&mut ctx, xy), analyzer.simplify(&mut ctx, yx));
}

#[test]
fn test_like_terms_cancel() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let (_, y) = ctx.fresh_var("y", DType::Int32);
    // (x + y) - (y - 3) - x == 3
    let lhs = ctx.add(x, y);
    let rhs = ctx.add_const(y, -3);
    let diff = ctx.sub(lhs, rhs);
    let diff = ctx.sub(diff, x);

    let simplified = analyzer.simplify(&mut ctx, diff);
    assert_eq!(ctx.as_const(simplified), Some(3));
}

#[test]
fn test_constant_factors_distribute() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    // (x + 2) * 4 - 4 * x == 8
    let shifted = ctx.add_const(x, 2);
    let scaled = ctx.mul_const(shifted, 4);
    let four = ctx.int(4);
    let four_x = ctx.mul(four, x);
    let diff = ctx.sub(scaled, four_x);

    let simplified = analyzer.simplify(&mut ctx, diff);
    assert_eq!(ctx.as_const(simplified), Some(8));
}

// ============================================================================
// Division and modulo
// ============================================================================

#[test]
fn test_split_then_recombine_evaluates_to_original() {
    let (mut ctx, mut analyzer, xv, x) = bound_var(128);
    let sixteen = ctx.int(16);
    let outer = ctx.floordiv(x, sixteen).unwrap();
    let inner = ctx.floormod(x, sixteen).unwrap();
    let scaled = ctx.mul(outer, sixteen);
    let recombined = ctx.add(scaled, inner);

    let simplified = analyzer.simplify(&mut ctx, recombined);
    let env = [(xv, 77)].into_iter().collect();
    assert_eq!(ctx.eval(simplified, &env), Some(77));
}

#[test]
fn test_divisible_terms_leave_the_division() {
    let (mut ctx, mut analyzer, _, x) = bound_var(8);
    let (_, y) = ctx.fresh_var("y", DType::Int32);
    // floordiv(y * 8 + x, 8) == y when x in [0, 8)
    let y8 = ctx.mul_const(y, 8);
    let sum = ctx.add(y8, x);
    let eight = ctx.int(8);
    let div = ctx.floordiv(sum, eight).unwrap();
    let rem = ctx.floormod(sum, eight).unwrap();

    assert_eq!(analyzer.simplify(&mut ctx, div), y);
    assert_eq!(analyzer.simplify(&mut ctx, rem), x);
}

#[test]
fn test_remainder_in_one_block_folds_to_offset() {
    let (mut ctx, mut analyzer, _, x) = bound_var(4);
    // floordiv(x + 8, 4) == 2 and floormod(x + 8, 4) == x for x in [0, 4)
    let shifted = ctx.add_const(x, 8);
    let four = ctx.int(4);
    let div = ctx.floordiv(shifted, four).unwrap();
    let rem = ctx.floormod(shifted, four).unwrap();

    let div = analyzer.simplify(&mut ctx, div);
    assert_eq!(ctx.as_const(div), Some(2));
    assert_eq!(analyzer.simplify(&mut ctx, rem), x);
}

#[test]
fn test_unbounded_division_stays_symbolic() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, n) = ctx.fresh_var("n", DType::Int32);
    let four = ctx.int(4);
    let div = ctx.floordiv(n, four).unwrap();

    assert_eq!(analyzer.simplify(&mut ctx, div), div);
}

// ============================================================================
// Bounds and proofs
// ============================================================================

#[test]
fn test_const_int_bound_of_bound_var() {
    let (mut ctx, mut analyzer, _, x) = bound_var(10);
    let scaled = ctx.mul_const(x, 3);
    let e = ctx.add_const(scaled, 1);

    assert_eq!(analyzer.const_int_bound(&ctx, e), ConstIntBound::new(1, 28));
}

#[test]
fn test_unbound_var_is_unbounded() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, n) = ctx.fresh_var("n", DType::Int32);

    assert_eq!(analyzer.const_int_bound(&ctx, n), ConstIntBound::new(NEG_INF, POS_INF));
}

#[test]
fn test_bound_follows_symbolic_range() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (n, ne) = ctx.fresh_var("n", DType::Int32);
    let (i, ie) = ctx.fresh_var("i", DType::Int32);
    let n_range = Range::literal(&mut ctx, 1, 64);
    analyzer.bind(n, n_range);
    let i_range = Range::from_extent(&mut ctx, ne);
    analyzer.bind(i, i_range);

    assert_eq!(analyzer.const_int_bound(&ctx, ie), ConstIntBound::new(0, 63));
}

#[test_case(128, true; "extent_is_exclusive")]
#[test_case(127, false; "last_index_not_below")]
fn test_can_prove_upper_bound(limit: i64, expected: bool) {
    let (mut ctx, mut analyzer, _, x) = bound_var(128);
    let limit = ctx.int(limit);
    let cond = ctx.lt(x, limit);
    assert_eq!(analyzer.can_prove(&mut ctx, cond), expected);
}

#[test]
fn test_can_prove_conjunction() {
    let (mut ctx, mut analyzer, _, x) = bound_var(16);
    let zero = ctx.int(0);
    let sixteen = ctx.int(16);
    let lower = ctx.ge(x, zero);
    let upper = ctx.lt(x, sixteen);
    let both = ctx.and(lower, upper);
    assert!(analyzer.can_prove(&mut ctx, both));

    let fifteen = ctx.int(15);
    let too_tight = ctx.lt(x, fifteen);
    let both = ctx.and(lower, too_tight);
    assert!(!analyzer.can_prove(&mut ctx, both));
}

#[test]
fn test_binding_invalidates_cached_proofs() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (x, xe) = ctx.fresh_var("x", DType::Int32);
    let eight = ctx.int(8);
    let cond = ctx.lt(xe, eight);

    assert!(!analyzer.can_prove(&mut ctx, cond));
    let range = Range::literal(&mut ctx, 0, 8);
    analyzer.bind(x, range);
    assert!(analyzer.can_prove(&mut ctx, cond));
}

#[test]
fn test_can_prove_equal_symbolic_products() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, n) = ctx.fresh_var("n", DType::Int32);
    let (_, m) = ctx.fresh_var("m", DType::Int32);
    let nm = ctx.mul(n, m);
    let mn = ctx.mul(m, n);
    let nm2 = ctx.mul_const(nm, 2);
    let sum = ctx.add(mn, mn);

    assert!(analyzer.can_prove_equal(&mut ctx, nm2, sum));
}

#[test]
fn test_min_max_decided_by_bounds() {
    let (mut ctx, mut analyzer, _, x) = bound_var(10);
    let hundred = ctx.int(100);
    let min = ctx.min(x, hundred);
    let max = ctx.max(x, hundred);

    assert_eq!(analyzer.simplify(&mut ctx, min), x);
    assert_eq!(analyzer.simplify(&mut ctx, max), hundred);
}
