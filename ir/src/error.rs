use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Division or modulo by a literal zero.
    #[snafu(display("division by zero"))]
    DivisionByZero,

    /// Parameter and dimension lists of an uninterpreted function differ in length.
    #[snafu(display("uninterpreted function {fname} has {parameters} parameters but {dimensions} dimensions"))]
    ArityMismatch { fname: String, parameters: usize, dimensions: usize },

    /// Argument and dimension lists of a call differ in length.
    #[snafu(display("call to {fname} has {args} arguments but {dims} argument dimensions"))]
    CallArityMismatch { fname: String, args: usize, dims: usize },

    /// A parameter's dimension was not supplied when substituting.
    #[snafu(display("no argument supplied for dimension {dimension} of {fname}"))]
    MissingDimensionArgument { fname: String, dimension: String },

    /// The function has no body to substitute or solve.
    #[snafu(display("uninterpreted function {fname} has no body"))]
    UndefinedBody { fname: String },

    /// `invert_call` could not solve the body for its parameters.
    #[snafu(display("cannot invert call to {fname}: {reason}"))]
    NotInvertible { fname: String, reason: &'static str },

    /// Free variable in a function body that is not one of its parameters.
    #[snafu(display("body of {fname} refers to {var}, which is not a parameter"))]
    FreeVariableInBody { fname: String, var: String },
}
