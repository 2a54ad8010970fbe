//! Typed objects: everything a name can resolve to.

use goco_common::Span;

use crate::ctx::PkgId;
use crate::types::TypeId;

/// Index of an object in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjId(pub u32);

/// The disjoint kinds of typed objects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Const,
    Var,
    Func,
    TypeName,
    PkgName,
    Builtin,
}

#[derive(Clone, Debug)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    /// Declaring package; `None` for universe-scope objects.
    pub pkg: Option<PkgId>,
    /// Declaration position. Scope walks skip objects declared after
    /// the cursor; universe objects carry a dummy span.
    pub pos: Span,
    pub typ: TypeId,
    /// For `PkgName` objects: the package the name refers to.
    pub imported: Option<PkgId>,
}

impl Object {
    /// Exported means starting with an upper-case letter, as in Go.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }
}
