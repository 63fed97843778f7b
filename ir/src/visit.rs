//! Traversals over the expression arena: rewriting, substitution, concrete
//! evaluation and free-variable collection.

use std::collections::{BTreeSet, HashMap};

use crate::context::Context;
use crate::expr::{Expr, ExprId, VarId};
use crate::types::BinaryOp;

impl Context {
    /// Post-order rewrite of `root`.
    ///
    /// `f` sees every node after its children were rewritten and may return a
    /// replacement. Shared sub-expressions are visited once.
    pub fn rewrite_post_order<E>(
        &mut self,
        root: ExprId,
        f: &mut dyn FnMut(&mut Context, ExprId) -> Result<Option<ExprId>, E>,
    ) -> Result<ExprId, E> {
        let mut memo = HashMap::new();
        self.rewrite_rec(root, f, &mut memo)
    }

    fn rewrite_rec<E>(
        &mut self,
        id: ExprId,
        f: &mut dyn FnMut(&mut Context, ExprId) -> Result<Option<ExprId>, E>,
        memo: &mut HashMap<ExprId, ExprId>,
    ) -> Result<ExprId, E> {
        if let Some(&done) = memo.get(&id) {
            return Ok(done);
        }
        let expr = self.expr(id).clone();
        let children = expr.children();
        let mut new_children = Vec::with_capacity(children.len());
        for &child in &children {
            new_children.push(self.rewrite_rec(child, f, memo)?);
        }
        let rebuilt = if new_children[..] == children[..] { id } else { self.rebuild(&expr, &new_children) };
        let result = f(self, rebuilt)?.unwrap_or(rebuilt);
        memo.insert(id, result);
        Ok(result)
    }

    /// Replace variables according to `map`.
    pub fn substitute(&mut self, root: ExprId, map: &HashMap<VarId, ExprId>) -> ExprId {
        if map.is_empty() {
            return root;
        }
        let result: Result<ExprId, std::convert::Infallible> = self.rewrite_post_order(root, &mut |ctx, id| {
            Ok(match ctx.expr(id) {
                Expr::Var(v) => map.get(v).copied(),
                _ => None,
            })
        });
        match result {
            Ok(id) => id,
            Err(never) => match never {},
        }
    }

    /// Evaluate `root` with concrete variable values.
    ///
    /// Calls are evaluated through the callee's body. Returns `None` when a
    /// variable is unassigned, a callee has no body, or arithmetic fails
    /// (division by zero, overflow).
    pub fn eval(&self, root: ExprId, env: &HashMap<VarId, i64>) -> Option<i64> {
        match self.expr(root) {
            Expr::Const { value, .. } => Some(*value),
            Expr::Var(v) => env.get(v).copied(),
            Expr::Binary(op, a, b) => op.eval(self.eval(*a, env)?, self.eval(*b, env)?),
            Expr::Cmp(op, a, b) => Some(op.eval(self.eval(*a, env)?, self.eval(*b, env)?) as i64),
            Expr::And(a, b) => Some((self.eval(*a, env)? != 0 && self.eval(*b, env)? != 0) as i64),
            Expr::Or(a, b) => Some((self.eval(*a, env)? != 0 || self.eval(*b, env)? != 0) as i64),
            Expr::Not(a) => Some((self.eval(*a, env)? == 0) as i64),
            Expr::Call { fun, args, dims } => {
                let callee = self.fun(*fun);
                let body = callee.body()?;
                let mut inner = HashMap::new();
                for (param, dim) in callee.parameters().iter().zip(callee.dimensions()) {
                    let pos = dims.iter().position(|d| d == dim)?;
                    inner.insert(*param, self.eval(*args.get(pos)?, env)?);
                }
                self.eval(body, &inner)
            }
        }
    }

    /// Variables referenced by `root`, in ascending id order.
    pub fn free_vars(&self, root: ExprId) -> Vec<VarId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let expr = self.expr(id);
            if let Expr::Var(v) = expr {
                seen.insert(*v);
            }
            stack.extend(expr.children());
        }
        seen.into_iter().collect()
    }

    /// Whether `root` contains a call node.
    pub fn contains_call(&self, root: ExprId) -> bool {
        match self.expr(root) {
            Expr::Call { .. } => true,
            expr => expr.children().into_iter().any(|c| self.contains_call(c)),
        }
    }

    /// Whether `root` is affine in its variables: built from constants,
    /// variables, `+`, `-` and multiplication where one side is constant.
    pub fn is_affine(&self, root: ExprId) -> bool {
        match self.expr(root) {
            Expr::Const { .. } | Expr::Var(_) => true,
            Expr::Binary(BinaryOp::Add | BinaryOp::Sub, a, b) => self.is_affine(*a) && self.is_affine(*b),
            Expr::Binary(BinaryOp::Mul, a, b) => {
                (self.as_const(*a).is_some() && self.is_affine(*b))
                    || (self.as_const(*b).is_some() && self.is_affine(*a))
            }
            _ => false,
        }
    }
}
