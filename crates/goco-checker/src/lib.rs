//! Error-tolerant Go type checking for goco.
//!
//! The checker's contract is shaped by completion, not compilation: it
//! always produces a best-effort typed package, unresolved references
//! type as invalid, and no error ever aborts a check. All type, object,
//! scope, and package data lives in a request-scoped [`TypeCtx`] arena,
//! which makes cyclic embedding graphs representable without reference
//! counting.

mod check;
mod ctx;
mod eval;
mod objects;
mod render;
mod resolve;
mod scope;
mod types;
mod universe;

pub use check::{check_package, Importer, NullImporter};
pub use ctx::{PkgId, TypeCtx};
pub use eval::{eval, lookup_member, EvalMode, TypeAndValue};
pub use objects::{ObjId, ObjKind, Object};
pub use render::type_string;
pub use scope::ScopeId;
pub use types::{BasicKind, ChanDir, StructField, TypeData, TypeId};
pub use universe::builtin_signature;
