//! Options for one bound-inference run.
//!
//! These control partial-input tolerance, guard suppression and proof
//! caching. Build them in code, or read them from `TESSERA_*` variables.

use std::collections::HashSet;

use bon::bon;
use tessera_ir::{Analyzer, IterVarId};

/// Options for [`infer_stage_bounds`](crate::infer_stage_bounds) and the
/// individual passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferConfig {
    /// Skip relations whose inputs are missing instead of failing.
    pub allow_missing: bool,
    /// Do not emit guards for root variables whose inferred domain differs
    /// from the declared one.
    pub skip_ivar_domain: bool,
    /// Cache analyzer answers for the duration of the invocation.
    pub memoize_proofs: bool,
    /// Variables that never receive a bound check.
    pub skip_iter: HashSet<IterVarId>,
}

#[bon]
impl InferConfig {
    /// Create an inference configuration with builder pattern.
    #[builder]
    pub fn builder(
        #[builder(default = false)] allow_missing: bool,
        #[builder(default = false)] skip_ivar_domain: bool,
        #[builder(default = true)] memoize_proofs: bool,
        #[builder(default)] skip_iter: HashSet<IterVarId>,
    ) -> Self {
        Self { allow_missing, skip_ivar_domain, memoize_proofs, skip_iter }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `TESSERA_ALLOW_MISSING` - Tolerate partially seeded maps
    /// * `TESSERA_SKIP_IVAR_DOMAIN` - Skip root-domain guards
    /// * `TESSERA_NO_PROOF_CACHE` - Disable analyzer memoization
    pub fn from_env() -> Self {
        Self {
            allow_missing: std::env::var("TESSERA_ALLOW_MISSING").is_ok(),
            skip_ivar_domain: std::env::var("TESSERA_SKIP_IVAR_DOMAIN").is_ok(),
            memoize_proofs: std::env::var("TESSERA_NO_PROOF_CACHE").is_err(),
            skip_iter: HashSet::new(),
        }
    }

    /// Fresh analyzer honoring `memoize_proofs`.
    pub fn analyzer(&self) -> Analyzer {
        if self.memoize_proofs { Analyzer::new() } else { Analyzer::without_memoization() }
    }
}

impl Default for InferConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
