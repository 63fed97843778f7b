//! Type definitions for index expressions.
//!
//! This module contains the small closed enums shared by the expression arena,
//! the analyzer and the message-passing passes: scalar dtypes and the operator
//! kinds an [`Expr`](crate::Expr) node can carry.

use std::fmt;

/// Scalar type of an index expression.
///
/// Index arithmetic only ever needs signed integers and booleans (for guard
/// predicates). Arithmetic results take the wider operand type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    Bool,
    #[default]
    Int32,
    Int64,
}

impl DType {
    pub const fn is_int(&self) -> bool {
        matches!(self, DType::Int32 | DType::Int64)
    }

    /// Wider of the two integer types. `Bool` promotes to `Int32`.
    pub fn promote(self, other: DType) -> DType {
        let lhs = if self == DType::Bool { DType::Int32 } else { self };
        let rhs = if other == DType::Bool { DType::Int32 } else { other };
        lhs.max(rhs)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Integer-valued binary operators.
///
/// Division and modulo use floor semantics (`floordiv(-1, 4) == -1`,
/// `floormod(-1, 4) == 3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    FloorMod,
    Min,
    Max,
}

impl BinaryOp {
    pub fn is_commutative(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Min | BinaryOp::Max)
    }

    /// Infix symbol, or `None` for operators rendered as calls.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("+"),
            BinaryOp::Sub => Some("-"),
            BinaryOp::Mul => Some("*"),
            BinaryOp::FloorDiv | BinaryOp::FloorMod | BinaryOp::Min | BinaryOp::Max => None,
        }
    }

    /// Evaluate on concrete values. `None` on division by zero or overflow.
    pub fn eval(&self, a: i64, b: i64) -> Option<i64> {
        match self {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::FloorDiv => floor_div(a, b),
            BinaryOp::FloorMod => floor_mod(a, b),
            BinaryOp::Min => Some(a.min(b)),
            BinaryOp::Max => Some(a.max(b)),
        }
    }
}

/// Comparison operators. Results are `DType::Bool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }

    pub fn eval(&self, a: i64, b: i64) -> bool {
        match self {
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
        }
    }
}

/// Floor division on concrete integers.
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let q = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) { Some(q - 1) } else { Some(q) }
}

/// Floor modulo on concrete integers; the result has the sign of `b`.
pub fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let q = floor_div(a, b)?;
    a.checked_sub(q.checked_mul(b)?)
}
