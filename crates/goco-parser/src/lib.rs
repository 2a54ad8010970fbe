//! Tolerant Go parsing for goco.
//!
//! The parser never fails: it records diagnostics, resynchronizes, and
//! always returns an AST with a package name, covering everything it
//! could recognize. Completion runs over half-written files, so this
//! recovery contract is what the rest of the pipeline is built on.

pub mod ast;
mod parser_impl;

pub use parser_impl::{
    parse_expr, parse_file, parse_file_at, parse_package_clause, ParseDiagnostic,
};
