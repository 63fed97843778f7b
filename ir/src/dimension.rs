//! Dimensions: axis identities independent of any concrete loop nest.

/// How a dimension's extent is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    /// Contiguous interval with a fixed extent.
    Range,
    /// Extent given by an uninterpreted function of other dimensions (ragged).
    Fun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub kind: DimensionKind,
}

impl Dimension {
    pub fn is_fun_dim(&self) -> bool {
        self.kind == DimensionKind::Fun
    }
}
