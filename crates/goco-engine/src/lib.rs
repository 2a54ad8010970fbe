//! The goco completion engine.
//!
//! Given a source buffer and a byte cursor, classify what the cursor
//! sits inside ([`context`]), analyze the surrounding package
//! ([`analyze`]), enumerate the members or scope identifiers that
//! apply ([`member`], [`suggest`]), and collect them into an ordered
//! candidate list ([`collector`]). [`format`] renders that list for
//! each supported editor; [`imports`] owns import-path suggestions and
//! the source importer.
//!
//! The engine holds no mutable process state except the import parse
//! cache, so concurrent requests only contend on that one mutex.

pub mod analyze;
pub mod collector;
pub mod context;
pub mod format;
pub mod imports;
pub mod member;
pub mod suggest;
pub mod token_iter;

pub use collector::{Candidate, Class};
pub use context::{deduce_cursor_context, CursorContext, DeducedContext};
pub use format::{formatter_by_name, Formatter};
pub use suggest::{Config, Suggester};

#[cfg(test)]
mod tests;
