//! End-to-end bound inference for a single stage.

use tessera_ir::{Context, IterVarType};

use crate::config::InferConfig;
use crate::error::Error;
use crate::infer::infer_stage_bounds;
use crate::stage::Stage;
use crate::test::helpers::{eval_at, literal, root, split_stage};

#[test]
#[tracing_test::traced_test]
fn test_ragged_split_end_to_end() {
    let mut ctx = Context::new();
    let (stage, i, outer, inner) = split_stage(&mut ctx, 128, 10);

    let bounds = infer_stage_bounds(&mut ctx, &stage, &InferConfig::default()).unwrap();
    assert_eq!(literal(&ctx, bounds.dom_map[&outer]), (0, 13));
    assert_eq!(literal(&ctx, bounds.dom_map[&inner]), (0, 10));
    assert_eq!(eval_at(&ctx, bounds.value_map[&i], &[(outer, 12), (inner, 7)]), Some(127));
    assert_eq!(bounds.predicates.len(), 1);
    assert!(logs_contain("stage bounds inferred"));
}

#[test]
fn test_split_then_fuse_end_to_end() {
    let mut ctx = Context::new();
    let i = root(&mut ctx, "i", 4);
    let j = root(&mut ctx, "j", 6);
    let mut stage = Stage::new("s", &[i, j]);
    let two = ctx.int(2);
    let (j_outer, j_inner) = stage.split(&mut ctx, j, two).unwrap();
    let fused = stage.fuse(&mut ctx, i, j_outer).unwrap();

    let bounds = infer_stage_bounds(&mut ctx, &stage, &InferConfig::default()).unwrap();
    assert_eq!(literal(&ctx, bounds.dom_map[&fused]), (0, 12));
    assert!(bounds.predicates.is_empty());
    for k in 0..12 {
        for r in 0..2 {
            let at = [(fused, k), (j_inner, r)];
            assert_eq!(eval_at(&ctx, bounds.value_map[&i], &at), Some(k / 3));
            assert_eq!(eval_at(&ctx, bounds.value_map[&j], &at), Some((k % 3) * 2 + r));
        }
    }
}

#[test]
fn test_bound_thread_receives_leaf_domain() {
    let mut ctx = Context::new();
    let (mut stage, _, _, inner) = split_stage(&mut ctx, 128, 32);
    let thread = ctx.thread_axis("threadIdx.x");
    stage.bind(&ctx, inner, thread).unwrap();

    let bounds = infer_stage_bounds(&mut ctx, &stage, &InferConfig::default()).unwrap();
    assert_eq!(literal(&ctx, bounds.dom_map[&thread]), (0, 32));
}

#[test]
fn test_root_without_domain_is_rejected() {
    let mut ctx = Context::new();
    let i = ctx.iter_var_new("i", None, IterVarType::DataPar);
    let stage = Stage::new("s", &[i]);

    let err = infer_stage_bounds(&mut ctx, &stage, &InferConfig::default()).unwrap_err();
    assert!(matches!(err, Error::UndeclaredDomain { ref iter_var } if iter_var == "i"));
}
