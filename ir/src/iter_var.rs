//! Iteration variables.

use crate::expr::VarId;
use crate::range::Range;

/// Iteration kind of an [`IterVar`].
///
/// Ordered so that fusing two variables yields the larger kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr)]
pub enum IterVarType {
    #[default]
    DataPar,
    ThreadIndex,
    CommReduce,
    Ordered,
    Opaque,
    Unrolled,
    Vectorized,
    Parallelized,
}

/// Loop iteration variable.
///
/// `dom` is the declared domain; variables derived by schedule primitives
/// start without one and get their range from domain propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterVar {
    pub var: VarId,
    pub dom: Option<Range>,
    pub iter_type: IterVarType,
    pub thread_tag: Option<String>,
}

impl IterVar {
    pub fn is_opaque(&self) -> bool {
        self.iter_type == IterVarType::Opaque
    }

    pub fn is_thread_index(&self) -> bool {
        self.iter_type == IterVarType::ThreadIndex
    }
}
