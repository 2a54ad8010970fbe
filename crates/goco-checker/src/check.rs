//! The package checker.
//!
//! Three passes over the merged file set: collect package-level names,
//! resolve their types, then walk function bodies building the scope
//! tree. Nothing here fails: unresolved names type as invalid and
//! checking continues, which is the contract completion needs.

use goco_common::Span;
use goco_parser::ast::{Block, CaseClause, Decl, Expr, File, FuncDecl, Stmt};
use goco_scanner::TokenKind;

use crate::ctx::{PkgId, TypeCtx};
use crate::eval::infer;
use crate::objects::{ObjId, ObjKind, Object};
use crate::resolve::Resolver;
use crate::scope::ScopeId;
use crate::types::{BasicKind, TypeData, TypeId};

/// Resolves an import path to a checked package.
///
/// Implementations decide where package source comes from; failures
/// return `None` and the import degrades to an unresolved reference.
pub trait Importer {
    fn import(&mut self, ctx: &mut TypeCtx, path: &str) -> Option<PkgId>;
}

/// An importer that resolves nothing; imports become dangling names.
pub struct NullImporter;

impl Importer for NullImporter {
    fn import(&mut self, _ctx: &mut TypeCtx, _path: &str) -> Option<PkgId> {
        None
    }
}

/// Type-check a package from its parsed files. Always succeeds.
pub fn check_package(
    ctx: &mut TypeCtx,
    path: &str,
    files: &[File],
    importer: &mut dyn Importer,
) -> PkgId {
    let name = files
        .iter()
        .map(|f| f.package_name.as_str())
        .find(|n| *n != "_")
        .unwrap_or("_");
    let pkg = ctx.new_package(name, path);
    let mut checker = Checker { ctx, pkg };
    checker.collect_imports(files, importer);
    let deferred = checker.collect_decls(files);
    checker.resolve_types(&deferred);
    checker.resolve_funcs(&deferred);
    checker.resolve_values(&deferred);
    checker.check_bodies(&deferred);
    pkg
}

/// Package-level declarations, split by pass.
#[derive(Default)]
struct Deferred<'a> {
    types: Vec<(&'a goco_parser::ast::TypeSpec, ObjId)>,
    values: Vec<(ObjKind, &'a goco_parser::ast::ValueSpec, Vec<ObjId>)>,
    funcs: Vec<(&'a FuncDecl, ObjId)>,
}

struct Checker<'a> {
    ctx: &'a mut TypeCtx,
    pkg: PkgId,
}

impl<'a> Checker<'a> {
    fn pkg_scope(&self) -> ScopeId {
        self.ctx.pkg(self.pkg).scope
    }

    fn resolver(&mut self) -> Resolver<'_> {
        Resolver {
            ctx: &mut *self.ctx,
            pkg: Some(self.pkg),
        }
    }

    fn collect_imports(&mut self, files: &[File], importer: &mut dyn Importer) {
        for file in files {
            for imp in &file.imports {
                let local = match &imp.alias {
                    Some(a) if a.name == "_" => continue,
                    Some(a) if a.name == "." => {
                        // Dot imports merge the imported scope; resolve
                        // and re-declare its exported names directly.
                        if let Some(dep) = importer.import(self.ctx, &imp.path) {
                            self.merge_dot_import(dep);
                        }
                        continue;
                    }
                    Some(a) => a.name.clone(),
                    None => imp
                        .path
                        .rsplit('/')
                        .next()
                        .unwrap_or(&imp.path)
                        .to_string(),
                };
                let imported = importer.import(self.ctx, &imp.path);
                if imported.is_none() {
                    tracing::debug!(target: "goco::checker", path = %imp.path, "unresolved import");
                }
                let obj = self.ctx.new_object(Object {
                    name: local.clone(),
                    kind: ObjKind::PkgName,
                    pkg: Some(self.pkg),
                    pos: imp.span,
                    typ: TypeId::INVALID,
                    imported,
                });
                self.ctx.declare(self.pkg_scope(), &local, obj);
            }
        }
    }

    fn merge_dot_import(&mut self, dep: PkgId) {
        let dep_scope = self.ctx.pkg(dep).scope;
        let exported: Vec<(String, ObjId)> = self
            .ctx
            .scope(dep_scope)
            .names
            .iter()
            .filter(|(_, &o)| self.ctx.obj(o).is_exported())
            .map(|(n, &o)| (n.clone(), o))
            .collect();
        for (name, obj) in exported {
            self.ctx.declare(self.pkg_scope(), &name, obj);
        }
    }

    fn collect_decls<'f>(&mut self, files: &'f [File]) -> Deferred<'f> {
        let mut out = Deferred::default();
        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Type(specs) => {
                        for spec in specs {
                            let obj = self.ctx.new_object(Object {
                                name: spec.name.name.clone(),
                                kind: ObjKind::TypeName,
                                pkg: Some(self.pkg),
                                pos: spec.name.span,
                                typ: TypeId::INVALID,
                                imported: None,
                            });
                            if !spec.alias {
                                let named = self.ctx.intern(TypeData::Named {
                                    obj,
                                    underlying: TypeId::INVALID,
                                    methods: Vec::new(),
                                });
                                self.ctx.obj_mut(obj).typ = named;
                            }
                            self.ctx.declare(self.pkg_scope(), &spec.name.name, obj);
                            out.types.push((spec, obj));
                        }
                    }
                    Decl::Const(specs) | Decl::Var(specs) => {
                        let kind = if matches!(decl, Decl::Const(_)) {
                            ObjKind::Const
                        } else {
                            ObjKind::Var
                        };
                        for spec in specs {
                            let mut ids = Vec::with_capacity(spec.names.len());
                            for name in &spec.names {
                                let obj = self.ctx.new_object(Object {
                                    name: name.name.clone(),
                                    kind,
                                    pkg: Some(self.pkg),
                                    pos: name.span,
                                    typ: TypeId::INVALID,
                                    imported: None,
                                });
                                self.ctx.declare(self.pkg_scope(), &name.name, obj);
                                ids.push(obj);
                            }
                            out.values.push((kind, spec, ids));
                        }
                    }
                    Decl::Func(func) => {
                        let obj = self.ctx.new_object(Object {
                            name: func.name.name.clone(),
                            kind: ObjKind::Func,
                            pkg: Some(self.pkg),
                            pos: func.name.span,
                            typ: TypeId::INVALID,
                            imported: None,
                        });
                        // Methods bind to their receiver's type, not the
                        // package scope.
                        if func.recv.is_none() && func.name.name != "init" {
                            self.ctx.declare(self.pkg_scope(), &func.name.name, obj);
                        }
                        out.funcs.push((func, obj));
                    }
                    Decl::Bad(_) => {}
                }
            }
        }
        out
    }

    fn resolve_types(&mut self, deferred: &Deferred<'_>) {
        let scope = self.pkg_scope();
        for (spec, obj) in &deferred.types {
            let resolved = self.resolver().resolve_type(&spec.typ, scope, None);
            if spec.alias {
                self.ctx.obj_mut(*obj).typ = resolved;
            } else {
                let named = self.ctx.obj(*obj).typ;
                self.ctx.set_named_underlying(named, resolved);
            }
        }
    }

    fn resolve_funcs(&mut self, deferred: &Deferred<'_>) {
        let scope = self.pkg_scope();
        for (func, obj) in &deferred.funcs {
            let recv_typ = func
                .recv
                .as_ref()
                .map(|f| self.resolver().resolve_type(&f.typ, scope, None));
            let sig = self.resolver().resolve_signature(&func.sig, scope, recv_typ);
            self.ctx.obj_mut(*obj).typ = sig;
            if let Some(recv) = recv_typ {
                if let Some(named) = self.ctx.named_of(recv) {
                    self.ctx.add_method(named, *obj);
                }
            }
        }
    }

    fn resolve_values(&mut self, deferred: &Deferred<'_>) {
        let scope = self.pkg_scope();
        for (kind, spec, ids) in &deferred.values {
            let declared = spec
                .typ
                .as_ref()
                .map(|t| self.resolver().resolve_type(t, scope, None));
            for (i, &obj) in ids.iter().enumerate() {
                let typ = if let Some(t) = declared {
                    t
                } else {
                    self.infer_spec_value(spec, i, *kind)
                };
                self.ctx.obj_mut(obj).typ = typ;
            }
        }
    }

    fn infer_spec_value(
        &mut self,
        spec: &goco_parser::ast::ValueSpec,
        index: usize,
        kind: ObjKind,
    ) -> TypeId {
        let scope = self.pkg_scope();
        let value = if spec.values.len() == spec.names.len() {
            spec.values.get(index)
        } else {
            spec.values.first()
        };
        let Some(value) = value else {
            // `const ( A; B )` iota groups default to untyped int.
            return if kind == ObjKind::Const {
                self.ctx.basic(BasicKind::UntypedInt)
            } else {
                TypeId::INVALID
            };
        };
        let tv = infer(self.ctx, scope, None, value);
        if spec.values.len() == 1 && spec.names.len() > 1 {
            return self.tuple_elem(tv.typ, index);
        }
        tv.typ
    }

    fn tuple_elem(&self, typ: TypeId, index: usize) -> TypeId {
        match self.ctx.type_data(typ) {
            TypeData::Tuple { elems } => elems.get(index).copied().unwrap_or(TypeId::INVALID),
            _ if index == 0 => typ,
            _ => TypeId::INVALID,
        }
    }

    // ------------------------------------------------------------------
    // Function bodies
    // ------------------------------------------------------------------

    fn check_bodies(&mut self, deferred: &Deferred<'_>) {
        for (func, obj) in &deferred.funcs {
            let Some(body) = &func.body else { continue };
            let fscope = self.ctx.new_scope(self.pkg_scope(), func.span);
            if let Some(recv) = &func.recv {
                let sig = self.ctx.obj(*obj).typ;
                let recv_typ = match self.ctx.type_data(sig) {
                    TypeData::Signature { recv: Some(r), .. } => *r,
                    _ => TypeId::INVALID,
                };
                for name in &recv.names {
                    self.declare_var(fscope, &name.name, name.span, recv_typ);
                }
            }
            self.declare_sig_names(fscope, &func.sig, self.ctx.obj(*obj).typ);
            self.check_stmts(fscope, &body.stmts);
        }
    }

    /// Declare named parameters and results of a signature into a
    /// function (or function literal) scope.
    fn declare_sig_names(
        &mut self,
        scope: ScopeId,
        sig_ast: &goco_parser::ast::FuncSig,
        sig: TypeId,
    ) {
        let (params, results) = match self.ctx.type_data(sig) {
            TypeData::Signature {
                params, results, ..
            } => (params.clone(), results.clone()),
            _ => return,
        };
        let mut flat = sig_ast.params.iter().flat_map(|f| f.names.iter());
        for p in &params {
            if p.name.is_empty() {
                continue;
            }
            if let Some(name) = flat.next() {
                self.declare_var(scope, &p.name, name.span, p.typ);
            }
        }
        let mut flat = sig_ast.results.iter().flat_map(|f| f.names.iter());
        for r in &results {
            if r.name.is_empty() {
                continue;
            }
            if let Some(name) = flat.next() {
                self.declare_var(scope, &r.name, name.span, r.typ);
            }
        }
    }

    fn declare_var(&mut self, scope: ScopeId, name: &str, pos: Span, typ: TypeId) {
        if name.is_empty() || name == "_" {
            return;
        }
        let obj = self.ctx.new_object(Object {
            name: name.to_string(),
            kind: ObjKind::Var,
            pkg: Some(self.pkg),
            pos,
            typ,
            imported: None,
        });
        self.ctx.declare(scope, name, obj);
    }

    fn check_stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(scope, stmt);
        }
    }

    fn check_block(&mut self, parent: ScopeId, block: &Block) {
        let scope = self.ctx.new_scope(parent, block.span);
        self.check_stmts(scope, &block.stmts);
    }

    fn check_stmt(&mut self, scope: ScopeId, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(Decl::Const(specs)) => self.check_local_values(scope, specs, ObjKind::Const),
            Stmt::Decl(Decl::Var(specs)) => self.check_local_values(scope, specs, ObjKind::Var),
            Stmt::Decl(Decl::Type(specs)) => {
                for spec in specs {
                    let obj = self.ctx.new_object(Object {
                        name: spec.name.name.clone(),
                        kind: ObjKind::TypeName,
                        pkg: Some(self.pkg),
                        pos: spec.name.span,
                        typ: TypeId::INVALID,
                        imported: None,
                    });
                    self.ctx.declare(scope, &spec.name.name, obj);
                    let resolved = self.resolver().resolve_type(&spec.typ, scope, None);
                    let typ = if spec.alias {
                        resolved
                    } else {
                        self.ctx.intern(TypeData::Named {
                            obj,
                            underlying: resolved,
                            methods: Vec::new(),
                        })
                    };
                    self.ctx.obj_mut(obj).typ = typ;
                }
            }
            Stmt::Decl(_) => {}
            Stmt::Expr(e) | Stmt::Go(e) | Stmt::Defer(e) => self.visit_expr(scope, e),
            Stmt::IncDec { x, .. } => self.visit_expr(scope, x),
            Stmt::Send { chan, value, .. } => {
                self.visit_expr(scope, chan);
                self.visit_expr(scope, value);
            }
            Stmt::Assign { lhs, op, rhs, .. } => {
                for e in rhs {
                    self.visit_expr(scope, e);
                }
                if *op == TokenKind::Define {
                    self.declare_short_vars(scope, lhs, rhs);
                } else {
                    for e in lhs {
                        self.visit_expr(scope, e);
                    }
                }
            }
            Stmt::Return { results, .. } => {
                for e in results {
                    self.visit_expr(scope, e);
                }
            }
            Stmt::Block(b) => self.check_block(scope, b),
            Stmt::If {
                init,
                cond,
                then,
                els,
                span,
            } => {
                let hscope = self.ctx.new_scope(scope, *span);
                if let Some(init) = init {
                    self.check_stmt(hscope, init);
                }
                self.visit_expr(hscope, cond);
                self.check_block(hscope, then);
                if let Some(els) = els {
                    self.check_stmt(hscope, els);
                }
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                span,
            } => {
                let hscope = self.ctx.new_scope(scope, *span);
                if let Some(init) = init {
                    self.check_stmt(hscope, init);
                }
                if let Some(cond) = cond {
                    self.visit_expr(hscope, cond);
                }
                if let Some(post) = post {
                    self.check_stmt(hscope, post);
                }
                self.check_block(hscope, body);
            }
            Stmt::Range {
                key,
                value,
                define,
                x,
                x_end,
                body,
                span,
            } => {
                let hscope = self.ctx.new_scope(scope, *span);
                self.visit_expr(hscope, x);
                let tv = infer(self.ctx, hscope, None, x);
                let (key_t, val_t) = self.range_element_types(tv.typ);
                if *define {
                    // Range variables come into scope at the end of the
                    // range expression, not at their own positions.
                    if let Some(Expr::Ident(id)) = key {
                        self.declare_var(hscope, &id.name, *x_end, key_t);
                    }
                    if let Some(Expr::Ident(id)) = value {
                        self.declare_var(hscope, &id.name, *x_end, val_t);
                    }
                }
                self.check_block(hscope, body);
            }
            Stmt::Switch {
                init,
                tag,
                cases,
                span,
            } => {
                let hscope = self.ctx.new_scope(scope, *span);
                if let Some(init) = init {
                    self.check_stmt(hscope, init);
                }
                if let Some(tag) = tag {
                    self.visit_expr(hscope, tag);
                }
                self.check_cases(hscope, cases);
            }
            Stmt::Select { cases, span } => {
                let hscope = self.ctx.new_scope(scope, *span);
                self.check_cases(hscope, cases);
            }
            Stmt::Labeled { stmt, .. } => self.check_stmt(scope, stmt),
            Stmt::Branch { .. } | Stmt::Empty(_) | Stmt::Bad(_) => {}
        }
    }

    fn check_cases(&mut self, scope: ScopeId, cases: &[CaseClause]) {
        for case in cases {
            let cscope = self.ctx.new_scope(scope, case.span);
            for e in &case.exprs {
                self.visit_expr(cscope, e);
            }
            self.check_stmts(cscope, &case.body);
        }
    }

    fn check_local_values(
        &mut self,
        scope: ScopeId,
        specs: &[goco_parser::ast::ValueSpec],
        kind: ObjKind,
    ) {
        for spec in specs {
            for e in &spec.values {
                self.visit_expr(scope, e);
            }
            let declared = spec
                .typ
                .as_ref()
                .map(|t| self.resolver().resolve_type(t, scope, None));
            for (i, name) in spec.names.iter().enumerate() {
                let typ = if let Some(t) = declared {
                    t
                } else {
                    let value = if spec.values.len() == spec.names.len() {
                        spec.values.get(i)
                    } else {
                        spec.values.first()
                    };
                    match value {
                        Some(v) => {
                            let tv = infer(self.ctx, scope, None, v);
                            if spec.values.len() == 1 && spec.names.len() > 1 {
                                self.tuple_elem(tv.typ, i)
                            } else {
                                tv.typ
                            }
                        }
                        None if kind == ObjKind::Const => self.ctx.basic(BasicKind::UntypedInt),
                        None => TypeId::INVALID,
                    }
                };
                let obj = self.ctx.new_object(Object {
                    name: name.name.clone(),
                    kind,
                    pkg: Some(self.pkg),
                    pos: name.span,
                    typ,
                    imported: None,
                });
                self.ctx.declare(scope, &name.name, obj);
            }
        }
    }

    fn declare_short_vars(&mut self, scope: ScopeId, lhs: &[Expr], rhs: &[Expr]) {
        let one_to_many = rhs.len() == 1 && lhs.len() > 1;
        let first = rhs.first().map(|e| infer(self.ctx, scope, None, e).typ);
        for (i, target) in lhs.iter().enumerate() {
            let Expr::Ident(id) = target else {
                self.visit_expr(scope, target);
                continue;
            };
            let typ = if one_to_many {
                let base = first.unwrap_or(TypeId::INVALID);
                match self.ctx.type_data(base) {
                    TypeData::Tuple { elems } => {
                        elems.get(i).copied().unwrap_or(TypeId::INVALID)
                    }
                    // `v, ok := m[k]` / `v, ok := <-ch` / type asserts.
                    _ if i == 0 => base,
                    _ => self.ctx.basic(BasicKind::Bool),
                }
            } else {
                rhs.get(i)
                    .map(|e| infer(self.ctx, scope, None, e).typ)
                    .unwrap_or(TypeId::INVALID)
            };
            self.declare_var(scope, &id.name, id.span, typ);
        }
    }

    fn range_element_types(&mut self, typ: TypeId) -> (TypeId, TypeId) {
        let int = self.ctx.basic(BasicKind::Int);
        let rune = self.ctx.basic(BasicKind::Int32);
        let under = self.ctx.underlying(typ);
        match self.ctx.type_data(under) {
            TypeData::Slice { elem } => (int, *elem),
            TypeData::Array { elem, .. } => (int, *elem),
            TypeData::Pointer { elem } => {
                let under = self.ctx.underlying(*elem);
                match self.ctx.type_data(under) {
                    TypeData::Array { elem, .. } => (int, *elem),
                    _ => (TypeId::INVALID, TypeId::INVALID),
                }
            }
            TypeData::Map { key, value } => (*key, *value),
            TypeData::Basic(BasicKind::String) => (int, rune),
            TypeData::Chan { elem, .. } => (*elem, TypeId::INVALID),
            TypeData::Basic(_) => (typ, TypeId::INVALID),
            _ => (TypeId::INVALID, TypeId::INVALID),
        }
    }

    /// Walk an expression for nested function literals so their bodies
    /// get scopes; the cursor is frequently inside a closure.
    fn visit_expr(&mut self, scope: ScopeId, expr: &Expr) {
        match expr {
            Expr::FuncLit { sig, body, span } => {
                let fscope = self.ctx.new_scope(scope, *span);
                let sig_typ = self.resolver().resolve_signature(sig, scope, None);
                self.declare_sig_names(fscope, sig, sig_typ);
                self.check_stmts(fscope, &body.stmts);
            }
            Expr::Paren { x, .. } | Expr::Star { x, .. } | Expr::Unary { x, .. } => {
                self.visit_expr(scope, x)
            }
            Expr::Selector { x, .. } => self.visit_expr(scope, x),
            Expr::Binary { x, y, .. } => {
                self.visit_expr(scope, x);
                self.visit_expr(scope, y);
            }
            Expr::Call { fun, args, .. } => {
                self.visit_expr(scope, fun);
                for a in args {
                    self.visit_expr(scope, a);
                }
            }
            Expr::Index { x, index, .. } => {
                self.visit_expr(scope, x);
                self.visit_expr(scope, index);
            }
            Expr::Slice { x, low, high, .. } => {
                self.visit_expr(scope, x);
                if let Some(e) = low {
                    self.visit_expr(scope, e);
                }
                if let Some(e) = high {
                    self.visit_expr(scope, e);
                }
            }
            Expr::TypeAssert { x, .. } => self.visit_expr(scope, x),
            Expr::Composite { elts, .. } => {
                for e in elts {
                    self.visit_expr(scope, e);
                }
            }
            Expr::KeyValue { key, value, .. } => {
                self.visit_expr(scope, key);
                self.visit_expr(scope, value);
            }
            _ => {}
        }
    }
}
