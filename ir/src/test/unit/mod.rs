pub mod analyzer;
pub mod constructors;
pub mod int_set;
