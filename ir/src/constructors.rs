//! Expression constructors.
//!
//! Constructors fold constants and drop arithmetic identities (`x + 0`,
//! `x * 1`, `x * 0`, `floordiv(x, 1)`, `floormod(x, 1)`) as they build, the way
//! hand-written index arithmetic is expected to come out. Anything beyond that
//! is the [`Analyzer`](crate::Analyzer)'s job.

use smallvec::SmallVec;
use snafu::ensure;

use crate::Result;
use crate::context::Context;
use crate::error::DivisionByZeroSnafu;
use crate::expr::{DimId, Expr, ExprId, FunId};
use crate::types::{BinaryOp, CmpOp, DType};

/// Arithmetic constructors without failure modes.
macro_rules! infallible_binary {
    ($($method:ident => $op:ident),+ $(,)?) => {
        $(
            pub fn $method(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
                self.binary(BinaryOp::$op, lhs, rhs)
            }
        )+
    };
}

/// Division-like constructors that reject a literal zero divisor.
macro_rules! division_binary {
    ($($method:ident => $op:ident),+ $(,)?) => {
        $(
            pub fn $method(&mut self, lhs: ExprId, rhs: ExprId) -> Result<ExprId> {
                ensure!(self.as_const(rhs) != Some(0), DivisionByZeroSnafu);
                Ok(self.binary(BinaryOp::$op, lhs, rhs))
            }
        )+
    };
}

macro_rules! comparisons {
    ($($method:ident => $op:ident),+ $(,)?) => {
        $(
            pub fn $method(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
                self.cmp(CmpOp::$op, lhs, rhs)
            }
        )+
    };
}

impl Context {
    // =========================================================================
    // Leaves
    // =========================================================================

    pub fn const_int(&mut self, value: i64, dtype: DType) -> ExprId {
        self.intern(Expr::Const { value, dtype })
    }

    /// `Int32` literal.
    pub fn int(&mut self, value: i64) -> ExprId {
        self.const_int(value, DType::Int32)
    }

    pub fn bool_const(&mut self, value: bool) -> ExprId {
        self.const_int(value as i64, DType::Bool)
    }

    pub fn zero(&mut self, dtype: DType) -> ExprId {
        self.const_int(0, dtype)
    }

    pub fn one(&mut self, dtype: DType) -> ExprId {
        self.const_int(1, dtype)
    }

    pub fn as_const(&self, id: ExprId) -> Option<i64> {
        match self.expr(id) {
            Expr::Const { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_zero(&self, id: ExprId) -> bool {
        self.as_const(id) == Some(0)
    }

    pub fn is_one(&self, id: ExprId) -> bool {
        self.as_const(id) == Some(1)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    infallible_binary! {
        add => Add,
        sub => Sub,
        mul => Mul,
        min => Min,
        max => Max,
    }

    division_binary! {
        floordiv => FloorDiv,
        floormod => FloorMod,
    }

    /// `lhs + rhs` with a literal right-hand side of the same dtype.
    pub fn add_const(&mut self, lhs: ExprId, rhs: i64) -> ExprId {
        let rhs = self.const_int(rhs, self.dtype(lhs));
        self.add(lhs, rhs)
    }

    /// `lhs * rhs` with a literal right-hand side of the same dtype.
    pub fn mul_const(&mut self, lhs: ExprId, rhs: i64) -> ExprId {
        let rhs = self.const_int(rhs, self.dtype(lhs));
        self.mul(lhs, rhs)
    }

    pub(crate) fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        let dtype = self.dtype(lhs).promote(self.dtype(rhs));
        if let (Some(a), Some(b)) = (self.as_const(lhs), self.as_const(rhs)) {
            if let Some(value) = op.eval(a, b) {
                return self.const_int(value, dtype);
            }
        }
        match op {
            BinaryOp::Add if self.is_zero(rhs) => return lhs,
            BinaryOp::Add if self.is_zero(lhs) => return rhs,
            BinaryOp::Sub if self.is_zero(rhs) => return lhs,
            BinaryOp::Sub if lhs == rhs => return self.zero(dtype),
            BinaryOp::Mul if self.is_one(rhs) => return lhs,
            BinaryOp::Mul if self.is_one(lhs) => return rhs,
            BinaryOp::Mul if self.is_zero(lhs) || self.is_zero(rhs) => return self.zero(dtype),
            BinaryOp::FloorDiv if self.is_one(rhs) => return lhs,
            BinaryOp::FloorMod if self.is_one(rhs) => return self.zero(dtype),
            BinaryOp::Min | BinaryOp::Max if lhs == rhs => return lhs,
            _ => {}
        }
        self.intern(Expr::Binary(op, lhs, rhs))
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    comparisons! {
        lt => Lt,
        le => Le,
        gt => Gt,
        ge => Ge,
        eq => Eq,
        ne => Ne,
    }

    pub fn cmp(&mut self, op: CmpOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        if let (Some(a), Some(b)) = (self.as_const(lhs), self.as_const(rhs)) {
            return self.bool_const(op.eval(a, b));
        }
        if lhs == rhs {
            return self.bool_const(matches!(op, CmpOp::Le | CmpOp::Ge | CmpOp::Eq));
        }
        self.intern(Expr::Cmp(op, lhs, rhs))
    }

    pub fn and(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        match (self.as_const(lhs), self.as_const(rhs)) {
            (Some(0), _) | (_, Some(0)) => self.bool_const(false),
            (Some(_), _) => rhs,
            (_, Some(_)) => lhs,
            _ if lhs == rhs => lhs,
            _ => self.intern(Expr::And(lhs, rhs)),
        }
    }

    pub fn or(&mut self, lhs: ExprId, rhs: ExprId) -> ExprId {
        match (self.as_const(lhs), self.as_const(rhs)) {
            (Some(a), _) if a != 0 => self.bool_const(true),
            (_, Some(b)) if b != 0 => self.bool_const(true),
            (Some(_), _) => rhs,
            (_, Some(_)) => lhs,
            _ if lhs == rhs => lhs,
            _ => self.intern(Expr::Or(lhs, rhs)),
        }
    }

    pub fn not(&mut self, value: ExprId) -> ExprId {
        if let Some(v) = self.as_const(value) {
            return self.bool_const(v == 0);
        }
        if let Expr::Not(inner) = self.expr(value) {
            return *inner;
        }
        self.intern(Expr::Not(value))
    }

    /// Conjunction of all `preds`; `true` when empty.
    pub fn all(&mut self, preds: &[ExprId]) -> ExprId {
        let mut acc = self.bool_const(true);
        for &pred in preds {
            acc = self.and(acc, pred);
        }
        acc
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// Raw call node. Callers must pass one dimension per argument; the
    /// public entry point is [`UninterpFun::make_call_to`](crate::UninterpFun::make_call_to).
    pub(crate) fn call(&mut self, fun: FunId, args: &[ExprId], dims: &[DimId]) -> ExprId {
        self.intern(Expr::Call { fun, args: SmallVec::from_slice(args), dims: SmallVec::from_slice(dims) })
    }

    /// Rebuild `expr` with new children, folding where the constructors would.
    pub(crate) fn rebuild(&mut self, expr: &Expr, children: &[ExprId]) -> ExprId {
        match expr {
            Expr::Const { .. } | Expr::Var(_) => self.intern(expr.clone()),
            Expr::Binary(op @ (BinaryOp::FloorDiv | BinaryOp::FloorMod), _, _) if self.is_zero(children[1]) => {
                self.intern(Expr::Binary(*op, children[0], children[1]))
            }
            Expr::Binary(op, _, _) => self.binary(*op, children[0], children[1]),
            Expr::Cmp(op, _, _) => self.cmp(*op, children[0], children[1]),
            Expr::And(_, _) => self.and(children[0], children[1]),
            Expr::Or(_, _) => self.or(children[0], children[1]),
            Expr::Not(_) => self.not(children[0]),
            Expr::Call { .. } => self.intern(expr.with_children(children)),
        }
    }
}
