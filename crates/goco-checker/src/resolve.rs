//! Type-expression resolution.
//!
//! Shared between the package checker and expression evaluation: both
//! need to turn a type AST into a `TypeId`, but only the checker has a
//! package to attribute new field/method objects to.

use goco_common::Span;
use goco_parser::ast::{Expr, Field, FuncSig, InterfaceElem};

use crate::ctx::{PkgId, TypeCtx};
use crate::objects::{ObjKind, Object};
use crate::scope::ScopeId;
use crate::types::{ChanDir, Param, StructField, TypeData, TypeId};

pub(crate) struct Resolver<'a> {
    pub ctx: &'a mut TypeCtx,
    /// Package to attribute synthesized field/method objects to; `None`
    /// when resolving inside a standalone evaluated expression.
    pub pkg: Option<PkgId>,
}

impl<'a> Resolver<'a> {
    pub fn resolve_type(&mut self, expr: &Expr, scope: ScopeId, pos: Option<u32>) -> TypeId {
        match expr {
            Expr::Ident(id) => match self.ctx.lookup_parent(scope, &id.name, pos) {
                Some(obj) if self.ctx.obj(obj).kind == ObjKind::TypeName => self.ctx.obj(obj).typ,
                _ => TypeId::INVALID,
            },
            Expr::Selector { x, sel, .. } => {
                if let Expr::Ident(pkg_id) = x.as_ref() {
                    if let Some(obj) = self.ctx.lookup_parent(scope, &pkg_id.name, pos) {
                        if let Some(dep) = self.ctx.obj(obj).imported {
                            let dep_scope = self.ctx.pkg(dep).scope;
                            if let Some(m) = self.ctx.lookup(dep_scope, &sel.name) {
                                if self.ctx.obj(m).kind == ObjKind::TypeName {
                                    return self.ctx.obj(m).typ;
                                }
                            }
                        }
                    }
                }
                TypeId::INVALID
            }
            Expr::Star { x, .. } => {
                let elem = self.resolve_type(x, scope, pos);
                self.ctx.pointer_to(elem)
            }
            Expr::Paren { x, .. } => self.resolve_type(x, scope, pos),
            Expr::ArrayType { len, elt, .. } => {
                let elem = self.resolve_type(elt, scope, pos);
                match len {
                    None => self.ctx.intern(TypeData::Slice { elem }),
                    Some(l) => {
                        let len = match l.as_ref() {
                            Expr::BasicLit { value, .. } => value.replace('_', "").parse().ok(),
                            _ => None,
                        };
                        self.ctx.intern(TypeData::Array { len, elem })
                    }
                }
            }
            Expr::MapType { key, value, .. } => {
                let key = self.resolve_type(key, scope, pos);
                let value = self.resolve_type(value, scope, pos);
                self.ctx.intern(TypeData::Map { key, value })
            }
            Expr::ChanType { dir, elt, .. } => {
                let elem = self.resolve_type(elt, scope, pos);
                let dir = match dir {
                    goco_parser::ast::ChanDir::Both => ChanDir::Both,
                    goco_parser::ast::ChanDir::Send => ChanDir::Send,
                    goco_parser::ast::ChanDir::Recv => ChanDir::Recv,
                };
                self.ctx.intern(TypeData::Chan { dir, elem })
            }
            Expr::FuncType { sig, .. } => self.resolve_signature(sig, scope, None),
            Expr::StructType { fields, .. } => self.resolve_struct(fields, scope, pos),
            Expr::InterfaceType { elems, .. } => self.resolve_interface(elems, scope, pos),
            Expr::Ellipsis { elt: Some(e), .. } => {
                let elem = self.resolve_type(e, scope, pos);
                self.ctx.intern(TypeData::Slice { elem })
            }
            _ => TypeId::INVALID,
        }
    }

    pub fn resolve_struct(&mut self, fields: &[Field], scope: ScopeId, pos: Option<u32>) -> TypeId {
        let mut out = Vec::new();
        for field in fields {
            let typ = self.resolve_type(&field.typ, scope, pos);
            if field.is_embedded() {
                let Some(name) = embedded_name(&field.typ) else {
                    continue;
                };
                let obj = self.field_object(name, field.span, typ);
                out.push(StructField {
                    obj,
                    embedded: true,
                });
            } else {
                for name in &field.names {
                    let obj = self.field_object(name.name.clone(), name.span, typ);
                    out.push(StructField {
                        obj,
                        embedded: false,
                    });
                }
            }
        }
        self.ctx.intern(TypeData::Struct { fields: out })
    }

    fn field_object(&mut self, name: String, pos: Span, typ: TypeId) -> crate::objects::ObjId {
        self.ctx.new_object(Object {
            name,
            kind: ObjKind::Var,
            pkg: self.pkg,
            pos,
            typ,
            imported: None,
        })
    }

    pub fn resolve_interface(
        &mut self,
        elems: &[InterfaceElem],
        scope: ScopeId,
        pos: Option<u32>,
    ) -> TypeId {
        let mut methods = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig, span } => {
                    let sig = self.resolve_signature(sig, scope, None);
                    let obj = self.ctx.new_object(Object {
                        name: name.name.clone(),
                        kind: ObjKind::Func,
                        pkg: self.pkg,
                        pos: *span,
                        typ: sig,
                        imported: None,
                    });
                    methods.push(obj);
                }
                InterfaceElem::Embedded(typ) => {
                    let embedded = self.resolve_type(typ, scope, pos);
                    let under = self.ctx.underlying(embedded);
                    if let TypeData::Interface {
                        methods: inherited, ..
                    } = self.ctx.type_data(under)
                    {
                        methods.extend(inherited.iter().copied());
                    }
                }
            }
        }
        self.ctx.intern(TypeData::Interface { methods })
    }

    pub fn resolve_signature(
        &mut self,
        sig: &FuncSig,
        scope: ScopeId,
        recv: Option<TypeId>,
    ) -> TypeId {
        let mut variadic = false;
        let params = self.resolve_params(&sig.params, scope, &mut variadic);
        let mut ignore = false;
        let results = self.resolve_params(&sig.results, scope, &mut ignore);
        self.ctx.intern(TypeData::Signature {
            recv,
            params,
            results,
            variadic,
        })
    }

    pub fn resolve_params(
        &mut self,
        fields: &[Field],
        scope: ScopeId,
        variadic: &mut bool,
    ) -> Vec<Param> {
        let mut out = Vec::new();
        for (i, field) in fields.iter().enumerate() {
            let last = i + 1 == fields.len();
            let typ = if let Expr::Ellipsis { elt: Some(e), .. } = &field.typ {
                if last {
                    *variadic = true;
                }
                let elem = self.resolve_type(e, scope, None);
                self.ctx.intern(TypeData::Slice { elem })
            } else {
                self.resolve_type(&field.typ, scope, None)
            };
            if field.names.is_empty() {
                out.push(Param {
                    name: String::new(),
                    typ,
                });
            } else {
                for name in &field.names {
                    out.push(Param {
                        name: name.name.clone(),
                        typ,
                    });
                }
            }
        }
        out
    }
}

/// The promoted name of an embedded field: `T`, `pkg.T`, `*T`, `*pkg.T`
/// all promote as `T`.
pub(crate) fn embedded_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(id) => Some(id.name.clone()),
        Expr::Selector { sel, .. } => Some(sel.name.clone()),
        Expr::Star { x, .. } => embedded_name(x),
        _ => None,
    }
}
