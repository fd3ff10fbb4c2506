//! Library components for the `csvx` command line tool.

pub mod check;
pub mod logging;
pub mod types;
