//! Expression nodes and the index types that address them.
//!
//! Every node lives in the [`Context`](crate::Context) arena and is referred to by
//! an [`ExprId`]. Nodes are hash-consed on insertion, so two structurally
//! identical expressions built in the same context always share one id and
//! syntactic equality is a plain id comparison.

use std::fmt;

use smallvec::SmallVec;

use crate::types::{BinaryOp, CmpOp, DType};

macro_rules! arena_index {
    ($($(#[$meta:meta])* $name:ident => $prefix:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) u32);

            impl $name {
                pub(crate) fn from_index(index: usize) -> Self {
                    Self(u32::try_from(index).expect("arena exceeded u32::MAX entries"))
                }

                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl fmt::Debug for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, concat!($prefix, "{}"), self.0)
                }
            }
        )+
    };
}

arena_index! {
    /// Handle to an interned expression node.
    ExprId => "e",
    /// Handle to a symbolic variable.
    VarId => "v",
    /// Handle to a [`Dimension`](crate::Dimension).
    DimId => "d",
    /// Handle to an [`UninterpFun`](crate::UninterpFun).
    FunId => "f",
    /// Handle to an [`IterVar`](crate::IterVar).
    IterVarId => "iv",
}

/// Expression node.
///
/// The variant set is closed: analyses match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Const { value: i64, dtype: DType },
    Var(VarId),
    Binary(BinaryOp, ExprId, ExprId),
    Cmp(CmpOp, ExprId, ExprId),
    And(ExprId, ExprId),
    Or(ExprId, ExprId),
    Not(ExprId),
    /// Call to an uninterpreted function. `dims[i]` names the dimension that
    /// `args[i]` supplies a value for.
    Call { fun: FunId, args: SmallVec<[ExprId; 4]>, dims: SmallVec<[DimId; 4]> },
}

impl Expr {
    pub fn children(&self) -> SmallVec<[ExprId; 4]> {
        match self {
            Expr::Const { .. } | Expr::Var(_) => SmallVec::new(),
            Expr::Binary(_, a, b) | Expr::Cmp(_, a, b) | Expr::And(a, b) | Expr::Or(a, b) => {
                SmallVec::from_slice(&[*a, *b])
            }
            Expr::Not(a) => SmallVec::from_slice(&[*a]),
            Expr::Call { args, .. } => args.clone(),
        }
    }

    /// Same node kind with its children replaced, in `children()` order.
    pub(crate) fn with_children(&self, children: &[ExprId]) -> Expr {
        match self {
            Expr::Const { .. } | Expr::Var(_) => self.clone(),
            Expr::Binary(op, _, _) => Expr::Binary(*op, children[0], children[1]),
            Expr::Cmp(op, _, _) => Expr::Cmp(*op, children[0], children[1]),
            Expr::And(_, _) => Expr::And(children[0], children[1]),
            Expr::Or(_, _) => Expr::Or(children[0], children[1]),
            Expr::Not(_) => Expr::Not(children[0]),
            Expr::Call { fun, dims, .. } => {
                Expr::Call { fun: *fun, args: SmallVec::from_slice(children), dims: dims.clone() }
            }
        }
    }
}

/// Symbolic variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarData {
    pub name: String,
    pub dtype: DType,
}
