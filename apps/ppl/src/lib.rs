//! # ppl
//!
//! Library side of the `ppl` binary: the clap command tree, the command
//! implementations and `ppl.toml` loading. Exposed as a library so the
//! commands can be driven from integration tests.

pub mod cli;
pub mod config;
