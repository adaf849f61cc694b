//! wiki2docs: convert a Nuclino workspace export into a Markdown docs tree
//!
//! # Architecture
//!
//! - `domain`: page hierarchy, reference patterns, link rewriting (no I/O)
//! - `application`: conversion service orchestrating parse and output
//! - `infrastructure`: filesystem boundary and service container
//! - `cli`: argument parsing, command execution, terminal output
//! - `config`: layered settings

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
