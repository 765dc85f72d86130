//! MSTest process and argument tests.
