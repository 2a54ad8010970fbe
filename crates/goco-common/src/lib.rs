//! Shared building blocks for the goco workspace.
//!
//! This crate owns the types that travel between every stage of the
//! pipeline: byte spans, the build-environment descriptor, and the
//! source-text helpers the client side applies before analysis.

pub mod env;
pub mod source;
pub mod span;

pub use env::BuildEnv;
pub use span::Span;
