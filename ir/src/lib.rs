//! Index-expression IR for the Tessera bound-inference engine.
//!
//! This crate defines the symbolic objects that iteration-space bound
//! inference reasons about: hash-consed integer expressions, ranges,
//! iteration variables, dimensions, uninterpreted functions, and the
//! analyzer that proves facts about them.
//!
//! # Module Organization
//!
//! - [`context`] - Per-invocation arena owning every node and symbol table
//! - [`expr`] - Expression nodes and the id types that address them
//! - [`constructors`] - Folding expression constructors
//! - [`visit`] - Rewriting, substitution and evaluation
//! - [`analyzer`] - Simplification, constant bounds and proofs
//! - [`int_set`] - Conservative interval sets
//! - [`range`] - Symbolic `(min, extent)` ranges
//! - [`iter_var`] / [`dimension`] - Loop variables and axis identities
//! - [`uninterp_fun`] - Uninterpreted functions: substitution, inversion,
//!   alpha-equivalence
//! - [`error`] - Error types and result handling

pub mod analyzer;
pub mod constructors;
pub mod context;
pub mod dimension;
pub mod display;
pub mod error;
pub mod expr;
pub mod int_set;
pub mod iter_var;
pub mod range;
pub mod types;
pub mod uninterp_fun;
pub mod visit;

#[cfg(test)]
pub mod test;

pub use analyzer::{Analyzer, ConstIntBound};
pub use context::Context;
pub use dimension::{Dimension, DimensionKind};
pub use error::{Error, Result};
pub use expr::{DimId, Expr, ExprId, FunId, IterVarId, VarData, VarId};
pub use int_set::{IntSet, eval_set};
pub use iter_var::{IterVar, IterVarType};
pub use range::Range;
pub use types::{BinaryOp, CmpOp, DType};
pub use uninterp_fun::{ArgMappingAndEquality, UninterpFun};
