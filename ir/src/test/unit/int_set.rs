//! Unit tests for interval-set evaluation.

use std::collections::HashMap;

use crate::types::DType;
use crate::{Analyzer, Context, IntSet, Range, eval_set};

fn interval(ctx: &mut Context, lo: i64, hi: i64) -> IntSet {
    let (lo, hi) = (ctx.int(lo), ctx.int(hi));
    IntSet::interval(lo, hi)
}

fn endpoints(ctx: &Context, set: IntSet) -> (Option<i64>, Option<i64>) {
    (set.min().and_then(|e| ctx.as_const(e)), set.max().and_then(|e| ctx.as_const(e)))
}

#[test]
fn test_range_to_set() {
    let mut ctx = Context::new();
    let r = Range::literal(&mut ctx, 2, 5);
    let set = IntSet::range(&mut ctx, r);
    assert_eq!(endpoints(&ctx, set), (Some(2), Some(6)));

    let point = Range::literal(&mut ctx, 3, 1);
    assert!(IntSet::range(&mut ctx, point).is_single_point());
}

#[test]
fn test_split_recombination_over_product_of_sets() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (o, oe) = ctx.fresh_var("o", DType::Int32);
    let (i, ie) = ctx.fresh_var("i", DType::Int32);
    // o * 16 + i over o in [0, 7], i in [0, 15]
    let scaled = ctx.mul_const(oe, 16);
    let e = ctx.add(scaled, ie);
    let dom = HashMap::from([(o, interval(&mut ctx, 0, 7)), (i, interval(&mut ctx, 0, 15))]);

    let set = eval_set(&mut ctx, &mut analyzer, e, &dom);
    assert_eq!(endpoints(&ctx, set), (Some(0), Some(127)));
}

#[test]
fn test_points_stay_points() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (f, fe) = ctx.fresh_var("f", DType::Int32);
    let four = ctx.int(4);
    let div = ctx.floordiv(fe, four).unwrap();
    let five = ctx.int(5);
    let dom = HashMap::from([(f, IntSet::single_point(five))]);

    let set = eval_set(&mut ctx, &mut analyzer, div, &dom);
    assert_eq!(set.point_value().and_then(|p| ctx.as_const(p)), Some(1));
}

#[test]
fn test_modulo_across_blocks_widens_to_full_residue_range() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (f, fe) = ctx.fresh_var("f", DType::Int32);
    let four = ctx.int(4);
    let rem = ctx.floormod(fe, four).unwrap();

    let within = HashMap::from([(f, interval(&mut ctx, 4, 6))]);
    let set = eval_set(&mut ctx, &mut analyzer, rem, &within);
    assert_eq!(endpoints(&ctx, set), (Some(0), Some(2)));

    let across = HashMap::from([(f, interval(&mut ctx, 2, 6))]);
    let set = eval_set(&mut ctx, &mut analyzer, rem, &across);
    assert_eq!(endpoints(&ctx, set), (Some(0), Some(3)));
}

#[test]
fn test_negative_factor_flips_interval() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (x, xe) = ctx.fresh_var("x", DType::Int32);
    let e = ctx.mul_const(xe, -2);
    let dom = HashMap::from([(x, interval(&mut ctx, 1, 3))]);

    let set = eval_set(&mut ctx, &mut analyzer, e, &dom);
    assert_eq!(endpoints(&ctx, set), (Some(-6), Some(-2)));
}

#[test]
fn test_unknown_vars_are_symbols() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let (_, n) = ctx.fresh_var("n", DType::Int32);
    let e = ctx.add_const(n, 1);

    let set = eval_set(&mut ctx, &mut analyzer, e, &HashMap::new());
    assert_eq!(set.point_value(), Some(e));
}

#[test]
fn test_match_range_and_union() {
    let mut ctx = Context::new();
    let mut analyzer = Analyzer::new();
    let r = Range::literal(&mut ctx, 0, 8);
    let set = interval(&mut ctx, 0, 7);
    assert!(set.match_range(&mut ctx, &mut analyzer, r));

    let other = interval(&mut ctx, 4, 12);
    let merged = set.union(&mut ctx, &mut analyzer, &other);
    assert_eq!(endpoints(&ctx, merged), (Some(0), Some(12)));
    assert!(!merged.match_range(&mut ctx, &mut analyzer, r));
    assert!(IntSet::everything().union(&mut ctx, &mut analyzer, &set).is_everything());
}
