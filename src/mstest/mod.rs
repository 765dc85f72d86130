//! MSTest process spawning, argument building and run orchestration.

mod args;
mod locate;
mod process;
mod run;

pub use args::*;
pub use locate::*;
pub use process::*;
pub use run::*;
