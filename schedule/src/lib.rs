//! Schedule-level bound inference for the Tessera compiler.
//!
//! Given a stage's schedule (splits, fuses, rebases, singletons and thread
//! bindings over its iteration variables) this crate resolves concrete
//! domains, explicit index expressions and the minimal set of runtime guard
//! predicates that code generation needs.
//!
//! # Module Organization
//!
//! - [`stage`] - Schedule primitives building the relation graph
//! - [`relation`] - Iteration-variable relations
//! - [`dimension_graph`] - Dimension relations for ragged iteration spaces
//! - [`message_passing`] - Forward and backward propagation passes
//!   - Domains, index expressions and value sets
//!   - Bit-mask reachability and bound-check synthesis
//!   - Dimension-graph passes with function inversion
//! - [`infer`] - Per-invocation driver producing [`StageBounds`]
//! - [`config`] - Inference options
//! - [`error`] - Error types and result handling

pub mod config;
pub mod dimension_graph;
pub mod error;
pub mod infer;
pub mod message_passing;
pub mod relation;
pub mod stage;


pub use config::InferConfig;
pub use dimension_graph::{ComputeOp, DimVarEntry, DimensionRelation, DimensionRelationGraph};
pub use error::{Error, Result};
pub use infer::{StageBounds, infer_stage_bounds, infer_stage_bounds_with_roots};
pub use message_passing::{
    BitMaskMap, BoundCheckMap, DimDomainMap, DimValueMap, DomainMap, SetMap, ValueMap, dimension_pass_down_domain,
    dimension_pass_down_values, make_bound_check, pass_down_bit_mask_or, pass_down_domain, pass_down_index,
    pass_up_bit_mask_or, pass_up_bound_check, pass_up_domain, pass_up_index,
};
pub use relation::{IterVarRelation, SplitFactor};
pub use stage::{IterVarAttr, Stage};
