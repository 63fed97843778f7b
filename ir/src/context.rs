//! Per-invocation context owning every node and symbol table.
//!
//! A [`Context`] is created for one lowering invocation and threaded through
//! every pass explicitly. It replaces process-wide registries: the expression
//! arena, the variable table, dimensions, iteration variables and uninterpreted
//! functions all live here and are addressed by `Copy` ids.

use std::collections::HashMap;

use crate::dimension::{Dimension, DimensionKind};
use crate::expr::{DimId, Expr, ExprId, FunId, IterVarId, VarData, VarId};
use crate::iter_var::{IterVar, IterVarType};
use crate::range::Range;
use crate::types::DType;
use crate::uninterp_fun::UninterpFun;

#[derive(Debug, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    dtypes: Vec<DType>,
    interner: HashMap<Expr, ExprId>,
    vars: Vec<VarData>,
    dims: Vec<Dimension>,
    iter_vars: Vec<IterVar>,
    funs: Vec<UninterpFun>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning the existing id if an identical node is present.
    pub(crate) fn intern(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interner.get(&expr) {
            return id;
        }
        let dtype = self.infer_dtype(&expr);
        let id = ExprId::from_index(self.nodes.len());
        self.nodes.push(expr.clone());
        self.dtypes.push(dtype);
        self.interner.insert(expr, id);
        id
    }

    fn infer_dtype(&self, expr: &Expr) -> DType {
        match expr {
            Expr::Const { dtype, .. } => *dtype,
            Expr::Var(v) => self.vars[v.index()].dtype,
            Expr::Binary(_, a, b) => self.dtype(*a).promote(self.dtype(*b)),
            Expr::Cmp(..) | Expr::And(..) | Expr::Or(..) | Expr::Not(_) => DType::Bool,
            Expr::Call { fun, .. } => {
                self.funs[fun.index()].body().map(|body| self.dtype(body)).unwrap_or(DType::Int32)
            }
        }
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn dtype(&self, id: ExprId) -> DType {
        self.dtypes[id.index()]
    }

    /// Number of interned nodes.
    pub fn num_exprs(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Variables
    // =========================================================================

    pub fn var(&mut self, name: impl Into<String>, dtype: DType) -> VarId {
        let id = VarId::from_index(self.vars.len());
        self.vars.push(VarData { name: name.into(), dtype });
        id
    }

    pub fn var_data(&self, var: VarId) -> &VarData {
        &self.vars[var.index()]
    }

    pub fn var_name(&self, var: VarId) -> &str {
        &self.vars[var.index()].name
    }

    /// Expression node referring to `var`.
    pub fn var_expr(&mut self, var: VarId) -> ExprId {
        self.intern(Expr::Var(var))
    }

    /// Fresh variable and its expression in one step.
    pub fn fresh_var(&mut self, name: impl Into<String>, dtype: DType) -> (VarId, ExprId) {
        let var = self.var(name, dtype);
        (var, self.var_expr(var))
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    pub fn dim(&mut self, name: impl Into<String>, kind: DimensionKind) -> DimId {
        let id = DimId::from_index(self.dims.len());
        self.dims.push(Dimension { name: name.into(), kind });
        id
    }

    pub fn dimension(&self, dim: DimId) -> &Dimension {
        &self.dims[dim.index()]
    }

    // =========================================================================
    // Iteration variables
    // =========================================================================

    pub fn add_iter_var(&mut self, iter_var: IterVar) -> IterVarId {
        let id = IterVarId::from_index(self.iter_vars.len());
        self.iter_vars.push(iter_var);
        id
    }

    /// Declare an iteration variable together with its backing variable.
    pub fn iter_var_new(
        &mut self,
        name: impl Into<String>,
        dom: Option<Range>,
        iter_type: IterVarType,
    ) -> IterVarId {
        let dtype = dom.map(|r| self.dtype(r.extent)).unwrap_or(DType::Int32);
        let var = self.var(name, dtype);
        self.add_iter_var(IterVar { var, dom, iter_type, thread_tag: None })
    }

    /// Thread axis named after its tag, e.g. `threadIdx.x`.
    pub fn thread_axis(&mut self, tag: impl Into<String>) -> IterVarId {
        let tag = tag.into();
        let var = self.var(tag.clone(), DType::Int32);
        self.add_iter_var(IterVar { var, dom: None, iter_type: IterVarType::ThreadIndex, thread_tag: Some(tag) })
    }

    pub fn iter_var(&self, iv: IterVarId) -> &IterVar {
        &self.iter_vars[iv.index()]
    }

    pub fn iter_var_name(&self, iv: IterVarId) -> &str {
        self.var_name(self.iter_vars[iv.index()].var)
    }

    /// Expression for the loop variable of `iv`.
    pub fn iter_var_expr(&mut self, iv: IterVarId) -> ExprId {
        let var = self.iter_vars[iv.index()].var;
        self.var_expr(var)
    }

    // =========================================================================
    // Uninterpreted functions
    // =========================================================================

    pub fn add_fun(&mut self, fun: UninterpFun) -> FunId {
        let id = FunId::from_index(self.funs.len());
        self.funs.push(fun);
        id
    }

    pub fn fun(&self, fun: FunId) -> &UninterpFun {
        &self.funs[fun.index()]
    }

    pub fn fun_mut(&mut self, fun: FunId) -> &mut UninterpFun {
        &mut self.funs[fun.index()]
    }
}
