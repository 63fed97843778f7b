//! Tests for the index-expression IR.
//!
//! - `unit` - focused tests per module
//! - `property` - proptest strategies and algebraic properties of the analyzer

pub mod unit;
