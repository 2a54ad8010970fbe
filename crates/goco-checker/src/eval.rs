//! Expression evaluation at a position.
//!
//! This is the checker-side service behind selector completion: given
//! the text of a primary expression and a cursor position, produce its
//! type and whether it denotes a type or an (addressable) value. The
//! implementation only has to cover the expression shapes the cursor
//! deducer can extract, plus whatever they recursively contain.

use goco_parser::ast::Expr;
use goco_scanner::TokenKind;

use crate::ctx::{PkgId, TypeCtx};
use crate::objects::{ObjId, ObjKind};
use crate::resolve::Resolver;
use crate::scope::ScopeId;
use crate::types::{BasicKind, TypeData, TypeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvalMode {
    Invalid,
    /// The expression denotes a type.
    Type,
    /// The expression denotes a value.
    Value { addressable: bool },
}

#[derive(Copy, Clone, Debug)]
pub struct TypeAndValue {
    pub mode: EvalMode,
    pub typ: TypeId,
}

impl TypeAndValue {
    pub const INVALID: TypeAndValue = TypeAndValue {
        mode: EvalMode::Invalid,
        typ: TypeId::INVALID,
    };

    pub fn is_type(&self) -> bool {
        self.mode == EvalMode::Type
    }

    pub fn is_value(&self) -> bool {
        matches!(self.mode, EvalMode::Value { .. })
    }

    pub fn addressable(&self) -> bool {
        matches!(
            self.mode,
            EvalMode::Value { addressable: true }
        )
    }

    fn value(typ: TypeId) -> TypeAndValue {
        TypeAndValue {
            mode: EvalMode::Value {
                addressable: false,
            },
            typ,
        }
    }

    fn addressable_value(typ: TypeId) -> TypeAndValue {
        TypeAndValue {
            mode: EvalMode::Value { addressable: true },
            typ,
        }
    }

    fn type_of(typ: TypeId) -> TypeAndValue {
        TypeAndValue {
            mode: EvalMode::Type,
            typ,
        }
    }
}

/// Evaluate `text` as an expression in the scope at `pos`.
pub fn eval(ctx: &mut TypeCtx, pkg: PkgId, pos: u32, text: &str) -> TypeAndValue {
    let Some(expr) = goco_parser::parse_expr(text.as_bytes()) else {
        return TypeAndValue::INVALID;
    };
    let root = ctx.pkg(pkg).scope;
    let scope = ctx.innermost(root, pos);
    infer(ctx, scope, Some(pos), &expr)
}

/// Infer the type-and-value of an expression AST in a scope.
pub(crate) fn infer(
    ctx: &mut TypeCtx,
    scope: ScopeId,
    pos: Option<u32>,
    expr: &Expr,
) -> TypeAndValue {
    infer_depth(ctx, scope, pos, expr, 32)
}

fn infer_depth(
    ctx: &mut TypeCtx,
    scope: ScopeId,
    pos: Option<u32>,
    expr: &Expr,
    depth: u8,
) -> TypeAndValue {
    if depth == 0 {
        return TypeAndValue::INVALID;
    }
    let depth = depth - 1;
    match expr {
        Expr::Ident(id) => {
            let Some(obj) = ctx.lookup_parent(scope, &id.name, pos) else {
                return TypeAndValue::INVALID;
            };
            object_tv(ctx, obj)
        }
        Expr::Selector { x, sel, .. } => {
            // Package-qualified name?
            if let Expr::Ident(base) = x.as_ref() {
                if let Some(obj) = ctx.lookup_parent(scope, &base.name, pos) {
                    if let Some(dep) = ctx.obj(obj).imported {
                        let dep_scope = ctx.pkg(dep).scope;
                        return match ctx.lookup(dep_scope, &sel.name) {
                            Some(m) => object_tv(ctx, m),
                            None => TypeAndValue::INVALID,
                        };
                    }
                }
            }
            let base = infer_depth(ctx, scope, pos, x, depth);
            match base.mode {
                EvalMode::Value { addressable } => {
                    let through_ptr =
                        matches!(ctx.type_data(base.typ), TypeData::Pointer { .. });
                    let Some(member) = lookup_member(ctx, base.typ, &sel.name) else {
                        return TypeAndValue::INVALID;
                    };
                    let obj = ctx.obj(member);
                    match obj.kind {
                        ObjKind::Var => {
                            if addressable || through_ptr {
                                TypeAndValue::addressable_value(obj.typ)
                            } else {
                                TypeAndValue::value(obj.typ)
                            }
                        }
                        _ => TypeAndValue::value(obj.typ),
                    }
                }
                EvalMode::Type => {
                    // Method expression; fields are not selectable.
                    let Some(member) = lookup_member(ctx, base.typ, &sel.name) else {
                        return TypeAndValue::INVALID;
                    };
                    let obj = ctx.obj(member);
                    if obj.kind == ObjKind::Func {
                        TypeAndValue::value(obj.typ)
                    } else {
                        TypeAndValue::INVALID
                    }
                }
                EvalMode::Invalid => TypeAndValue::INVALID,
            }
        }
        Expr::Star { x, .. } => {
            let inner = infer_depth(ctx, scope, pos, x, depth);
            match inner.mode {
                EvalMode::Type => TypeAndValue::type_of(ctx.pointer_to(inner.typ)),
                EvalMode::Value { .. } => match ctx.type_data(ctx.underlying(inner.typ)) {
                    TypeData::Pointer { elem } => TypeAndValue::addressable_value(*elem),
                    _ => TypeAndValue::INVALID,
                },
                EvalMode::Invalid => TypeAndValue::INVALID,
            }
        }
        Expr::Unary { op, x, .. } => {
            let inner = infer_depth(ctx, scope, pos, x, depth);
            match op {
                TokenKind::And => {
                    if inner.is_value() {
                        let ptr = ctx.pointer_to(inner.typ);
                        TypeAndValue::value(ptr)
                    } else {
                        TypeAndValue::INVALID
                    }
                }
                TokenKind::Arrow => {
                    let under = ctx.underlying(inner.typ);
                    match ctx.type_data(under) {
                        TypeData::Chan { elem, .. } => TypeAndValue::value(*elem),
                        _ => TypeAndValue::INVALID,
                    }
                }
                TokenKind::Not => {
                    let b = ctx.basic(BasicKind::UntypedBool);
                    TypeAndValue::value(b)
                }
                _ => TypeAndValue::value(inner.typ),
            }
        }
        Expr::Paren { x, .. } => infer_depth(ctx, scope, pos, x, depth),
        Expr::Call { fun, args, .. } => infer_call(ctx, scope, pos, fun, args, depth),
        Expr::Index { x, .. } => {
            let base = infer_depth(ctx, scope, pos, x, depth);
            if base.is_type() {
                // Generic instantiation; treat as the base type itself.
                return base;
            }
            let mut under = ctx.underlying(base.typ);
            let mut through_ptr = false;
            if let TypeData::Pointer { elem } = ctx.type_data(under) {
                under = ctx.underlying(*elem);
                through_ptr = true;
            }
            match ctx.type_data(under) {
                TypeData::Slice { elem } => TypeAndValue::addressable_value(*elem),
                TypeData::Array { elem, .. } => {
                    if base.addressable() || through_ptr {
                        TypeAndValue::addressable_value(*elem)
                    } else {
                        TypeAndValue::value(*elem)
                    }
                }
                TypeData::Map { value, .. } => TypeAndValue::value(*value),
                TypeData::Basic(BasicKind::String | BasicKind::UntypedString) => {
                    let byte = ctx.basic(BasicKind::Uint8);
                    TypeAndValue::value(byte)
                }
                _ => TypeAndValue::INVALID,
            }
        }
        Expr::Slice { x, .. } => {
            let base = infer_depth(ctx, scope, pos, x, depth);
            let under = ctx.underlying(base.typ);
            match ctx.type_data(under) {
                TypeData::Array { elem, .. } => {
                    let elem = *elem;
                    let slice = ctx.intern(TypeData::Slice { elem });
                    TypeAndValue::value(slice)
                }
                TypeData::Pointer { elem } => {
                    let inner = ctx.underlying(*elem);
                    match ctx.type_data(inner) {
                        TypeData::Array { elem, .. } => {
                            let elem = *elem;
                            let slice = ctx.intern(TypeData::Slice { elem });
                            TypeAndValue::value(slice)
                        }
                        _ => TypeAndValue::INVALID,
                    }
                }
                _ => TypeAndValue::value(base.typ),
            }
        }
        Expr::TypeAssert { typ: Some(t), .. } => {
            let resolved = Resolver { ctx, pkg: None }.resolve_type(t, scope, pos);
            TypeAndValue::value(resolved)
        }
        Expr::TypeAssert { typ: None, .. } => TypeAndValue::INVALID,
        Expr::Composite { typ: Some(t), .. } => {
            let tv = infer_depth(ctx, scope, pos, t, depth);
            if tv.is_type() {
                TypeAndValue::value(tv.typ)
            } else {
                TypeAndValue::INVALID
            }
        }
        Expr::Composite { typ: None, .. } => TypeAndValue::INVALID,
        Expr::KeyValue { .. } => TypeAndValue::INVALID,
        Expr::BasicLit { kind, .. } => {
            let basic = match kind {
                TokenKind::Int => BasicKind::UntypedInt,
                TokenKind::Float => BasicKind::UntypedFloat,
                TokenKind::Imag => BasicKind::UntypedComplex,
                TokenKind::Char => BasicKind::UntypedRune,
                _ => BasicKind::UntypedString,
            };
            let t = ctx.basic(basic);
            TypeAndValue::value(t)
        }
        Expr::FuncLit { sig, .. } => {
            let t = Resolver { ctx, pkg: None }.resolve_signature(sig, scope, None);
            TypeAndValue::value(t)
        }
        Expr::Binary { op, x, y, .. } => {
            match op {
                TokenKind::Eql
                | TokenKind::Neq
                | TokenKind::Lss
                | TokenKind::Leq
                | TokenKind::Gtr
                | TokenKind::Geq
                | TokenKind::LAnd
                | TokenKind::LOr => {
                    let b = ctx.basic(BasicKind::UntypedBool);
                    TypeAndValue::value(b)
                }
                _ => {
                    // Arithmetic: prefer the typed operand.
                    let xt = infer_depth(ctx, scope, pos, x, depth);
                    let yt = infer_depth(ctx, scope, pos, y, depth);
                    let untyped_x = matches!(
                        ctx.type_data(xt.typ),
                        TypeData::Basic(k) if is_untyped(*k)
                    );
                    if xt.typ.is_invalid() || (untyped_x && !yt.typ.is_invalid()) {
                        TypeAndValue::value(yt.typ)
                    } else {
                        TypeAndValue::value(xt.typ)
                    }
                }
            }
        }
        Expr::ArrayType { .. }
        | Expr::MapType { .. }
        | Expr::ChanType { .. }
        | Expr::StructType { .. }
        | Expr::InterfaceType { .. }
        | Expr::FuncType { .. } => {
            let t = Resolver { ctx, pkg: None }.resolve_type(expr, scope, pos);
            TypeAndValue::type_of(t)
        }
        Expr::Ellipsis { .. } | Expr::Bad(_) => TypeAndValue::INVALID,
    }
}

fn object_tv(ctx: &TypeCtx, obj: ObjId) -> TypeAndValue {
    let o = ctx.obj(obj);
    match o.kind {
        ObjKind::TypeName => TypeAndValue::type_of(o.typ),
        ObjKind::Var => TypeAndValue::addressable_value(o.typ),
        ObjKind::Const | ObjKind::Func => TypeAndValue::value(o.typ),
        ObjKind::PkgName | ObjKind::Builtin => TypeAndValue::INVALID,
    }
}

fn infer_call(
    ctx: &mut TypeCtx,
    scope: ScopeId,
    pos: Option<u32>,
    fun: &Expr,
    args: &[Expr],
    depth: u8,
) -> TypeAndValue {
    // Builtin calls first; builtins have no signature type.
    if let Expr::Ident(id) = fun {
        if let Some(obj) = ctx.lookup_parent(scope, &id.name, pos) {
            if ctx.obj(obj).kind == ObjKind::Builtin {
                return infer_builtin_call(ctx, scope, pos, &id.name, args, depth);
            }
        }
    }
    let tv = infer_depth(ctx, scope, pos, fun, depth);
    match tv.mode {
        // Conversion `T(x)`.
        EvalMode::Type => TypeAndValue::value(tv.typ),
        EvalMode::Value { .. } => {
            let under = ctx.underlying(tv.typ);
            match ctx.type_data(under) {
                TypeData::Signature { results, .. } => match results.len() {
                    0 => TypeAndValue::INVALID,
                    1 => TypeAndValue::value(results[0].typ),
                    _ => {
                        let elems: Vec<TypeId> = results.iter().map(|r| r.typ).collect();
                        let t = ctx.intern(TypeData::Tuple { elems });
                        TypeAndValue::value(t)
                    }
                },
                _ => TypeAndValue::INVALID,
            }
        }
        EvalMode::Invalid => TypeAndValue::INVALID,
    }
}

fn infer_builtin_call(
    ctx: &mut TypeCtx,
    scope: ScopeId,
    pos: Option<u32>,
    name: &str,
    args: &[Expr],
    depth: u8,
) -> TypeAndValue {
    match name {
        "len" | "cap" | "copy" => {
            let t = ctx.basic(BasicKind::Int);
            TypeAndValue::value(t)
        }
        "new" => {
            let Some(arg) = args.first() else {
                return TypeAndValue::INVALID;
            };
            let tv = infer_depth(ctx, scope, pos, arg, depth);
            if tv.is_type() {
                let ptr = ctx.pointer_to(tv.typ);
                TypeAndValue::value(ptr)
            } else {
                TypeAndValue::INVALID
            }
        }
        "make" => {
            let Some(arg) = args.first() else {
                return TypeAndValue::INVALID;
            };
            let tv = infer_depth(ctx, scope, pos, arg, depth);
            if tv.is_type() {
                TypeAndValue::value(tv.typ)
            } else {
                TypeAndValue::INVALID
            }
        }
        "append" => {
            let Some(arg) = args.first() else {
                return TypeAndValue::INVALID;
            };
            let tv = infer_depth(ctx, scope, pos, arg, depth);
            TypeAndValue::value(tv.typ)
        }
        "recover" => {
            let t = ctx.intern(TypeData::Interface {
                methods: Vec::new(),
            });
            TypeAndValue::value(t)
        }
        "complex" => {
            let t = ctx.basic(BasicKind::Complex128);
            TypeAndValue::value(t)
        }
        "real" | "imag" => {
            let t = ctx.basic(BasicKind::Float64);
            TypeAndValue::value(t)
        }
        _ => TypeAndValue::INVALID,
    }
}

fn is_untyped(kind: BasicKind) -> bool {
    matches!(
        kind,
        BasicKind::UntypedBool
            | BasicKind::UntypedInt
            | BasicKind::UntypedRune
            | BasicKind::UntypedFloat
            | BasicKind::UntypedComplex
            | BasicKind::UntypedString
            | BasicKind::UntypedNil
    )
}

/// Find the field or method `name` on `typ`, searching embedded fields
/// breadth-first so shallower members win.
pub fn lookup_member(ctx: &TypeCtx, typ: TypeId, name: &str) -> Option<ObjId> {
    let mut current = vec![typ];
    let mut next = Vec::new();
    let mut visited: Vec<TypeId> = Vec::new();

    while !current.is_empty() {
        for t in current.drain(..) {
            let base = match ctx.type_data(t) {
                TypeData::Pointer { elem } => *elem,
                _ => t,
            };
            if let TypeData::Named { methods, .. } = ctx.type_data(base) {
                if visited.contains(&base) {
                    continue;
                }
                visited.push(base);
                for &m in methods {
                    if ctx.obj(m).name == name {
                        return Some(m);
                    }
                }
            }
            let under = ctx.underlying(base);
            match ctx.type_data(under) {
                TypeData::Interface { methods } => {
                    for &m in methods {
                        if ctx.obj(m).name == name {
                            return Some(m);
                        }
                    }
                }
                TypeData::Struct { fields } => {
                    for f in fields {
                        if ctx.obj(f.obj).name == name {
                            return Some(f.obj);
                        }
                        if f.embedded {
                            next.push(ctx.obj(f.obj).typ);
                        }
                    }
                }
                _ => {}
            }
        }
        std::mem::swap(&mut current, &mut next);
    }
    None
}
