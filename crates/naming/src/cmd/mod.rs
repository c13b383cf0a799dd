//! Subcommands of the `naming` binary.

pub mod plan;
pub mod run;
