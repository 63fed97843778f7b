//! Constructor folding and hash-consing.

use test_case::test_case;

use crate::types::{BinaryOp, DType};
use crate::{Context, Error, Expr};

#[test]
fn test_structurally_equal_nodes_share_an_id() {
    let mut ctx = Context::new();
    let x = ctx.var("x", DType::Int32);
    let (x1, x2) = (ctx.var_expr(x), ctx.var_expr(x));
    let four = ctx.int(4);
    let a = ctx.mul(x1, four);
    let before = ctx.num_exprs();
    let b = ctx.mul(x2, four);

    assert_eq!(a, b);
    assert_eq!(ctx.num_exprs(), before);
}

#[test]
fn test_distinct_vars_with_same_name_are_distinct() {
    let mut ctx = Context::new();
    let (_, a) = ctx.fresh_var("i", DType::Int32);
    let (_, b) = ctx.fresh_var("i", DType::Int32);
    assert_ne!(a, b);
}

#[test_case(BinaryOp::Add, 7, 3, 10; "add")]
#[test_case(BinaryOp::Sub, 7, 3, 4; "sub")]
#[test_case(BinaryOp::Mul, 7, 3, 21; "mul")]
#[test_case(BinaryOp::FloorDiv, -7, 2, -4; "floordiv_negative")]
#[test_case(BinaryOp::FloorMod, -7, 2, 1; "floormod_negative")]
#[test_case(BinaryOp::Min, 7, 3, 3; "min")]
#[test_case(BinaryOp::Max, 7, 3, 7; "max")]
fn test_constant_folding(op: BinaryOp, a: i64, b: i64, expected: i64) {
    let mut ctx = Context::new();
    let (a, b) = (ctx.int(a), ctx.int(b));
    let folded = ctx.binary(op, a, b);
    assert_eq!(ctx.as_const(folded), Some(expected));
}

#[test]
fn test_identities_are_dropped() {
    let mut ctx = Context::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let (zero, one) = (ctx.int(0), ctx.int(1));

    assert_eq!(ctx.add(x, zero), x);
    assert_eq!(ctx.add(zero, x), x);
    assert_eq!(ctx.sub(x, zero), x);
    assert_eq!(ctx.mul(x, one), x);
    assert_eq!(ctx.mul(one, x), x);
    assert_eq!(ctx.floordiv(x, one).unwrap(), x);

    let sub_self = ctx.sub(x, x);
    assert!(ctx.is_zero(sub_self));
    let mul_zero = ctx.mul(x, zero);
    assert!(ctx.is_zero(mul_zero));
    let mod_one = ctx.floormod(x, one).unwrap();
    assert!(ctx.is_zero(mod_one));
}

#[test]
fn test_literal_zero_divisor_is_rejected() {
    let mut ctx = Context::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let zero = ctx.int(0);

    assert_eq!(ctx.floordiv(x, zero), Err(Error::DivisionByZero));
    assert_eq!(ctx.floormod(x, zero), Err(Error::DivisionByZero));
}

#[test]
fn test_dtype_promotion() {
    let mut ctx = Context::new();
    let (_, narrow) = ctx.fresh_var("n", DType::Int32);
    let (_, wide) = ctx.fresh_var("w", DType::Int64);
    let sum = ctx.add(narrow, wide);
    let cmp = ctx.lt(narrow, wide);

    assert_eq!(ctx.dtype(sum), DType::Int64);
    assert_eq!(ctx.dtype(cmp), DType::Bool);
}

#[test]
fn test_logic_folding() {
    let mut ctx = Context::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let ten = ctx.int(10);
    let p = ctx.lt(x, ten);
    let (t, f) = (ctx.bool_const(true), ctx.bool_const(false));

    assert_eq!(ctx.and(t, p), p);
    assert_eq!(ctx.and(p, f), f);
    assert_eq!(ctx.or(f, p), p);
    assert_eq!(ctx.or(p, t), t);
    let not_p = ctx.not(p);
    assert_eq!(ctx.not(not_p), p);
    assert_eq!(ctx.all(&[]), t);
    assert_eq!(ctx.all(&[p, t]), p);
}

#[test]
fn test_comparison_of_same_operand_folds() {
    let mut ctx = Context::new();
    let (_, x) = ctx.fresh_var("x", DType::Int32);
    let le = ctx.le(x, x);
    let lt = ctx.lt(x, x);

    assert_eq!(ctx.as_const(le), Some(1));
    assert_eq!(ctx.as_const(lt), Some(0));
    assert!(matches!(ctx.expr(le), Expr::Const { dtype: DType::Bool, .. }));
}

#[test]
fn test_substitute_rebuilds_with_folding() {
    let mut ctx = Context::new();
    let (x, xe) = ctx.fresh_var("x", DType::Int32);
    let three = ctx.int(3);
    let e = ctx.mul(xe, three);
    let e = ctx.add_const(e, 1);

    let two = ctx.int(2);
    let map = [(x, two)].into_iter().collect();
    let substituted = ctx.substitute(e, &map);

    assert_eq!(ctx.as_const(substituted), Some(7));
}
