use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Two derivations of a domain disagree.
    #[snafu(display(
        "{iter_var} domain already inferred, cannot prove their extents are the same {existing} vs {new}"
    ))]
    InconsistentDomain { iter_var: String, existing: String, new: String },

    /// Two derivations of an index value disagree.
    #[snafu(display("{iter_var} value already inferred, cannot prove {existing} == {new}"))]
    InconsistentValue { iter_var: String, existing: String, new: String },

    /// A relation endpoint has no entry and partial input is not allowed.
    #[snafu(display("{pass}: no entry for {role} {iter_var}"))]
    MissingEntry { pass: &'static str, role: &'static str, iter_var: String },

    /// Index propagation requires a zero-based domain.
    #[snafu(display("{pass}: {iter_var} must start at 0, found min {min}"))]
    NonZeroMin { pass: &'static str, iter_var: String, min: String },

    /// Schedule primitive applied to a variable that is not a leaf.
    #[snafu(display("{iter_var} is not a leaf of stage {stage}"))]
    NotALeaf { stage: String, iter_var: String },

    /// Fuse requires `outer` immediately followed by `inner` in the leaf order.
    #[snafu(display("cannot fuse {outer} and {inner}: they are not adjacent leaves in that order"))]
    FuseNotAdjacent { outer: String, inner: String },

    /// Split factor is not a positive value.
    #[snafu(display("invalid split factor {factor} for {iter_var}"))]
    InvalidSplitFactor { iter_var: String, factor: String },

    /// A dimension has no defining iteration variable / function in the operation.
    #[snafu(display("operation {op} has no dim-var entry for dimension {dimension}"))]
    MissingDimVarEntry { op: String, dimension: String },

    /// A root variable has no declared domain.
    #[snafu(display("root iteration variable {iter_var} has no declared domain"))]
    UndeclaredDomain { iter_var: String },

    #[snafu(context(false), display("{source}"))]
    Ir { source: tessera_ir::Error },
}
