//! Lexical scopes.
//!
//! Scopes form a tree rooted at the universe scope. Each carries the
//! byte extent it covers; `innermost` descends by extent, and
//! `lookup_parent` respects declaration positions in local scopes
//! (package and universe names are visible everywhere).

use goco_common::Span;
use rustc_hash::FxHashMap;

use crate::objects::ObjId;

/// Index of a scope in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const UNIVERSE: ScopeId = ScopeId(0);
}

#[derive(Debug, Default)]
pub struct ScopeData {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub names: FxHashMap<String, ObjId>,
    /// Byte extent this scope covers; dummy for universe and package
    /// scopes, which are position-independent.
    pub extent: Span,
}
