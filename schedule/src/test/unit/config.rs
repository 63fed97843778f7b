use std::collections::HashSet;

use tessera_ir::Context;

use crate::config::InferConfig;
use crate::test::helpers::root;

#[test]
fn test_default_matches_builder_defaults() {
    let config = InferConfig::default();
    assert!(!config.allow_missing);
    assert!(!config.skip_ivar_domain);
    assert!(config.memoize_proofs);
    assert!(config.skip_iter.is_empty());
    assert_eq!(config, InferConfig::builder().build());
}

#[test]
fn test_builder_overrides() {
    let mut ctx = Context::new();
    let i = root(&mut ctx, "i", 8);
    let config = InferConfig::builder()
        .allow_missing(true)
        .memoize_proofs(false)
        .skip_iter(HashSet::from([i]))
        .build();

    assert!(config.allow_missing);
    assert!(!config.memoize_proofs);
    assert!(config.skip_iter.contains(&i));
}
