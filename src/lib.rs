//! MSTest runner - run MSTest and stream its console output as structured
//! test results.

pub mod config;
pub mod display;
pub mod mstest;
pub mod parser;
