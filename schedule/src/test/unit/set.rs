//! Unit tests for value-set propagation.

use tessera_ir::{Analyzer, Context, IntSet, IterVarId, IterVarType};

use crate::error::Error;
use crate::message_passing::{DomainMap, SetMap, pass_up_domain};
use crate::stage::Stage;
use crate::test::helpers::{endpoints, inferred_domains, interval, root, root_with, split_stage};

/// `i` over `[0, 4)` and `j` over `[0, 4)`, fused.
fn fused_stage(ctx: &mut Context) -> (Stage, DomainMap, [IterVarId; 3]) {
    let i = root(ctx, "i", 4);
    let j = root(ctx, "j", 4);
    let mut stage = Stage::new("s", &[i, j]);
    let fused = stage.fuse(ctx, i, j).unwrap();
    let dom_map = inferred_domains(ctx, &stage);
    (stage, dom_map, [i, j, fused])
}

#[test]
fn test_fused_point_decomposes_exactly() {
    let mut ctx = Context::new();
    let (stage, dom_map, [i, j, fused]) = fused_stage(&mut ctx);
    let five = ctx.int(5);
    let mut set_map = SetMap::from([(fused, IntSet::single_point(five))]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(set_map[&i].point_value().and_then(|p| ctx.as_const(p)), Some(1));
    assert_eq!(set_map[&j].point_value().and_then(|p| ctx.as_const(p)), Some(1));
}

#[test]
fn test_fused_full_range_takes_fast_path() {
    let mut ctx = Context::new();
    let (stage, dom_map, [i, j, fused]) = fused_stage(&mut ctx);
    let full = IntSet::range(&mut ctx, dom_map[&fused]);
    let mut set_map = SetMap::from([(fused, full)]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(set_map[&i], IntSet::range(&mut ctx, dom_map[&i]));
    assert_eq!(set_map[&j], IntSet::range(&mut ctx, dom_map[&j]));
}

#[test]
fn test_aligned_fused_interval_is_tight() {
    let mut ctx = Context::new();
    let (stage, dom_map, [i, j, fused]) = fused_stage(&mut ctx);
    // Span 2 divides the inner extent 4 and the interval starts on a multiple of 2.
    let mut set_map = SetMap::from([(fused, interval(&mut ctx, 6, 7))]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(endpoints(&ctx, set_map[&i]), (1, 1));
    assert_eq!(endpoints(&ctx, set_map[&j]), (2, 3));
}

#[test]
#[tracing_test::traced_test]
fn test_unaligned_fused_interval_widens_inner() {
    let mut ctx = Context::new();
    let (stage, dom_map, [i, j, fused]) = fused_stage(&mut ctx);
    let mut set_map = SetMap::from([(fused, interval(&mut ctx, 2, 5))]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(endpoints(&ctx, set_map[&i]), (0, 1));
    assert_eq!(endpoints(&ctx, set_map[&j]), (0, 3));
    assert!(logs_contain("not aligned"));
}

#[test]
#[tracing_test::traced_test]
fn test_block_aligned_fused_interval_widens_quietly() {
    let mut ctx = Context::new();
    let (stage, dom_map, [i, j, fused]) = fused_stage(&mut ctx);
    // Two whole rows: inner covers its full range, which is also exact.
    let mut set_map = SetMap::from([(fused, interval(&mut ctx, 4, 11))]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(endpoints(&ctx, set_map[&i]), (1, 2));
    assert_eq!(endpoints(&ctx, set_map[&j]), (0, 3));
    assert!(!logs_contain("not aligned"));
}

#[test]
fn test_split_full_children_give_parent_domain() {
    let mut ctx = Context::new();
    let (stage, i, outer, inner) = split_stage(&mut ctx, 128, 16);
    let dom_map = inferred_domains(&mut ctx, &stage);
    let outer_set = IntSet::range(&mut ctx, dom_map[&outer]);
    let inner_set = IntSet::range(&mut ctx, dom_map[&inner]);
    let mut set_map = SetMap::from([(outer, outer_set), (inner, inner_set)]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(endpoints(&ctx, set_map[&i]), (0, 127));
}

#[test]
fn test_split_partial_children_are_evaluated() {
    let mut ctx = Context::new();
    let (stage, i, outer, inner) = split_stage(&mut ctx, 128, 16);
    let dom_map = inferred_domains(&mut ctx, &stage);
    let two = ctx.int(2);
    let inner_set = IntSet::range(&mut ctx, dom_map[&inner]);
    let mut set_map = SetMap::from([(outer, IntSet::single_point(two)), (inner, inner_set)]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(endpoints(&ctx, set_map[&i]), (32, 47));
}

#[test]
fn test_rebase_shifts_by_parent_min() {
    let mut ctx = Context::new();
    let i = root_with(&mut ctx, "i", 2, 5, IterVarType::DataPar);
    let mut stage = Stage::new("s", &[i]);
    let rebased = stage.rebase(&mut ctx, i).unwrap();
    let dom_map = inferred_domains(&mut ctx, &stage);
    let one = ctx.int(1);
    let mut set_map = SetMap::from([(rebased, IntSet::single_point(one))]);

    pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap();
    assert_eq!(set_map[&i].point_value().and_then(|p| ctx.as_const(p)), Some(3));
}

#[test]
fn test_missing_child_set_is_fatal() {
    let mut ctx = Context::new();
    let (stage, _, outer, _) = split_stage(&mut ctx, 128, 16);
    let dom_map = inferred_domains(&mut ctx, &stage);
    let mut set_map = SetMap::from([(outer, IntSet::everything())]);

    let err = pass_up_domain(&mut ctx, &mut Analyzer::new(), &stage, &dom_map, &mut set_map).unwrap_err();
    assert!(matches!(err, Error::MissingEntry { role: "inner", .. }));
}
