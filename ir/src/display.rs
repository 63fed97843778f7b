//! Human-readable rendering of expressions for diagnostics.

use std::fmt;

use crate::context::Context;
use crate::expr::{Expr, ExprId};
use crate::types::DType;

/// Borrowing wrapper that renders an expression through [`fmt::Display`].
pub struct ExprDisplay<'a> {
    ctx: &'a Context,
    id: ExprId,
}

impl Context {
    pub fn display(&self, id: ExprId) -> ExprDisplay<'_> {
        ExprDisplay { ctx: self, id }
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.ctx;
        let show = |id: ExprId| ExprDisplay { ctx, id };
        match ctx.expr(self.id) {
            Expr::Const { value, dtype: DType::Bool } => write!(f, "{}", *value != 0),
            Expr::Const { value, .. } => write!(f, "{value}"),
            Expr::Var(v) => f.write_str(ctx.var_name(*v)),
            Expr::Binary(op, a, b) => match op.symbol() {
                Some(sym) => write!(f, "({} {sym} {})", show(*a), show(*b)),
                None => write!(f, "{}({}, {})", op.as_ref(), show(*a), show(*b)),
            },
            Expr::Cmp(op, a, b) => write!(f, "({} {} {})", show(*a), op.symbol(), show(*b)),
            Expr::And(a, b) => write!(f, "({} && {})", show(*a), show(*b)),
            Expr::Or(a, b) => write!(f, "({} || {})", show(*a), show(*b)),
            Expr::Not(a) => write!(f, "!{}", show(*a)),
            Expr::Call { fun, args, .. } => {
                write!(f, "{}(", ctx.fun(*fun).fname())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", show(*arg))?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Debug for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {self}", self.id)
    }
}
