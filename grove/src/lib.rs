//! Grove: a branch lineage workflow tool layered over git.
//!
//! User commands (`hack`, `sync`, `ship`, `kill`, ...) expand into linear
//! programs of typed opcodes. The interpreter executes them atomically from
//! the user's perspective: on a merge conflict it persists its run state,
//! lets the user fix things, and resumes, unwinds, or undoes on request.

pub mod cmd;
pub mod config;
pub mod core;
pub mod errors;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod plan;
pub mod test_support;
pub mod undo;
pub mod vm;
