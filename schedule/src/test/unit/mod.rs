pub mod config;
pub mod infer;
pub mod set;
