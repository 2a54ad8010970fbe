//! The per-request arena holding all typed data.

use goco_common::Span;
use rustc_hash::FxHashMap;

use crate::objects::{ObjId, Object};
use crate::scope::{ScopeData, ScopeId};
use crate::types::{BasicKind, TypeData, TypeId};
use crate::universe;

/// Index of a package in the arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PkgId(pub u32);

#[derive(Debug)]
pub struct PackageData {
    pub name: String,
    pub path: String,
    pub scope: ScopeId,
}

/// Arena for types, objects, scopes, and packages.
///
/// One `TypeCtx` serves one completion request; nothing in it outlives
/// the request, which keeps the engine re-entrant.
pub struct TypeCtx {
    types: Vec<TypeData>,
    interned: FxHashMap<TypeData, TypeId>,
    objs: Vec<Object>,
    scopes: Vec<ScopeData>,
    pkgs: Vec<PackageData>,
}

impl TypeCtx {
    pub fn new() -> Self {
        let mut ctx = TypeCtx {
            types: vec![TypeData::Invalid],
            interned: FxHashMap::default(),
            objs: Vec::new(),
            scopes: vec![ScopeData {
                parent: None,
                children: Vec::new(),
                names: FxHashMap::default(),
                extent: Span::dummy(),
            }],
            pkgs: Vec::new(),
        };
        universe::install(&mut ctx);
        ctx
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Intern a structural type; named types are always fresh since
    /// their identity is their declaration, not their shape.
    pub fn intern(&mut self, data: TypeData) -> TypeId {
        if matches!(data, TypeData::Named { .. }) {
            return self.push_type(data);
        }
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = self.push_type(data.clone());
        self.interned.insert(data, id);
        id
    }

    fn push_type(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        self.intern(TypeData::Basic(kind))
    }

    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Pointer { elem })
    }

    pub fn set_named_underlying(&mut self, named: TypeId, underlying: TypeId) {
        if let TypeData::Named {
            underlying: ref mut u,
            ..
        } = self.types[named.0 as usize]
        {
            *u = underlying;
        }
    }

    pub fn add_method(&mut self, named: TypeId, method: ObjId) {
        if let TypeData::Named {
            ref mut methods, ..
        } = self.types[named.0 as usize]
        {
            methods.push(method);
        }
    }

    /// The structural type behind a (chain of) named type(s).
    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut cur = id;
        for _ in 0..64 {
            match self.type_data(cur) {
                TypeData::Named { underlying, .. } => {
                    if underlying.is_invalid() || *underlying == cur {
                        return *underlying;
                    }
                    cur = *underlying;
                }
                _ => return cur,
            }
        }
        TypeId::INVALID
    }

    /// The named type `T` given `T` or `*T`, if any.
    pub fn named_of(&self, id: TypeId) -> Option<TypeId> {
        let base = match self.type_data(id) {
            TypeData::Pointer { elem } => *elem,
            _ => id,
        };
        match self.type_data(base) {
            TypeData::Named { .. } => Some(base),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    pub fn new_object(&mut self, obj: Object) -> ObjId {
        let id = ObjId(self.objs.len() as u32);
        self.objs.push(obj);
        id
    }

    pub fn obj(&self, id: ObjId) -> &Object {
        &self.objs[id.0 as usize]
    }

    pub fn obj_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objs[id.0 as usize]
    }

    /// Selector identity key: exported names collide globally, others
    /// only within their package.
    pub fn obj_sel_key(&self, id: ObjId) -> String {
        let obj = self.obj(id);
        if obj.is_exported() {
            return obj.name.clone();
        }
        let path = obj
            .pkg
            .map(|p| self.pkg(p).path.clone())
            .unwrap_or_default();
        format!("{path};{}", obj.name)
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    pub fn new_scope(&mut self, parent: ScopeId, extent: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            parent: Some(parent),
            children: Vec::new(),
            names: FxHashMap::default(),
            extent,
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0 as usize]
    }

    /// Declare a name; the first declaration wins, as later duplicates
    /// are errors the checker tolerates.
    pub fn declare(&mut self, scope: ScopeId, name: &str, obj: ObjId) {
        if name == "_" {
            return;
        }
        self.scopes[scope.0 as usize]
            .names
            .entry(name.to_string())
            .or_insert(obj);
    }

    /// The innermost scope at `pos`, starting from `root`.
    pub fn innermost(&self, root: ScopeId, pos: u32) -> ScopeId {
        let mut cur = root;
        'descend: loop {
            for &child in &self.scope(cur).children {
                let extent = self.scope(child).extent;
                if !extent.is_dummy() && extent.contains(pos) {
                    cur = child;
                    continue 'descend;
                }
            }
            return cur;
        }
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<ObjId> {
        self.scope(scope).names.get(name).copied()
    }

    /// Resolve `name` from `scope` outward. In position-bearing scopes,
    /// objects declared after `pos` are not yet visible.
    pub fn lookup_parent(&self, scope: ScopeId, name: &str, pos: Option<u32>) -> Option<ObjId> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            let data = self.scope(s);
            if let Some(&obj) = data.names.get(name) {
                let positional = !data.extent.is_dummy();
                let visible = match (positional, pos) {
                    (true, Some(p)) => {
                        let decl = self.obj(obj).pos;
                        decl.is_dummy() || decl.start <= p
                    }
                    _ => true,
                };
                if visible {
                    return Some(obj);
                }
            }
            cur = data.parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Packages
    // ------------------------------------------------------------------

    pub fn new_package(&mut self, name: &str, path: &str) -> PkgId {
        let scope = self.new_scope(ScopeId::UNIVERSE, Span::dummy());
        let id = PkgId(self.pkgs.len() as u32);
        self.pkgs.push(PackageData {
            name: name.to_string(),
            path: path.to_string(),
            scope,
        });
        id
    }

    pub fn pkg(&self, id: PkgId) -> &PackageData {
        &self.pkgs[id.0 as usize]
    }

    pub fn find_package(&self, path: &str) -> Option<PkgId> {
        self.pkgs
            .iter()
            .position(|p| p.path == path)
            .map(|i| PkgId(i as u32))
    }
}

impl Default for TypeCtx {
    fn default() -> Self {
        Self::new()
    }
}
