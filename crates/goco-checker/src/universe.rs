//! The universe scope: predeclared types, constants, and builtins.

use goco_common::Span;

use crate::ctx::TypeCtx;
use crate::objects::{ObjKind, Object};
use crate::scope::ScopeId;
use crate::types::{BasicKind, Param, TypeData, TypeId};

pub(crate) fn install(ctx: &mut TypeCtx) {
    use BasicKind::*;

    let type_names = [
        ("bool", Bool),
        ("int", Int),
        ("int8", Int8),
        ("int16", Int16),
        ("int32", Int32),
        ("int64", Int64),
        ("uint", Uint),
        ("uint8", Uint8),
        ("uint16", Uint16),
        ("uint32", Uint32),
        ("uint64", Uint64),
        ("uintptr", Uintptr),
        ("float32", Float32),
        ("float64", Float64),
        ("complex64", Complex64),
        ("complex128", Complex128),
        ("string", String),
        ("byte", Uint8),
        ("rune", Int32),
    ];
    for (name, kind) in type_names {
        let typ = ctx.basic(kind);
        declare(ctx, name, ObjKind::TypeName, typ);
    }

    // `any` is an alias for the empty interface.
    let empty_iface = ctx.intern(TypeData::Interface {
        methods: Vec::new(),
    });
    declare(ctx, "any", ObjKind::TypeName, empty_iface);

    let untyped_bool = ctx.basic(UntypedBool);
    declare(ctx, "true", ObjKind::Const, untyped_bool);
    declare(ctx, "false", ObjKind::Const, untyped_bool);
    let untyped_int = ctx.basic(UntypedInt);
    declare(ctx, "iota", ObjKind::Const, untyped_int);
    let untyped_nil = ctx.basic(UntypedNil);
    declare(ctx, "nil", ObjKind::Const, untyped_nil);

    for name in [
        "append", "cap", "close", "complex", "copy", "delete", "imag", "len", "make", "new",
        "panic", "print", "println", "real", "recover",
    ] {
        declare(ctx, name, ObjKind::Builtin, TypeId::INVALID);
    }

    install_error(ctx);
}

/// `type error interface { Error() string }`.
fn install_error(ctx: &mut TypeCtx) {
    let obj = ctx.new_object(Object {
        name: "error".to_string(),
        kind: ObjKind::TypeName,
        pkg: None,
        pos: Span::dummy(),
        typ: TypeId::INVALID,
        imported: None,
    });
    let named = ctx.intern(TypeData::Named {
        obj,
        underlying: TypeId::INVALID,
        methods: Vec::new(),
    });
    ctx.obj_mut(obj).typ = named;

    let string_ty = ctx.basic(BasicKind::String);
    let sig = ctx.intern(TypeData::Signature {
        recv: Some(named),
        params: Vec::new(),
        results: vec![Param {
            name: std::string::String::new(),
            typ: string_ty,
        }],
        variadic: false,
    });
    let method = ctx.new_object(Object {
        name: "Error".to_string(),
        kind: ObjKind::Func,
        pkg: None,
        pos: Span::dummy(),
        typ: sig,
        imported: None,
    });
    let iface = ctx.intern(TypeData::Interface {
        methods: vec![method],
    });
    ctx.set_named_underlying(named, iface);
    ctx.declare(ScopeId::UNIVERSE, "error", obj);
}

fn declare(ctx: &mut TypeCtx, name: &str, kind: ObjKind, typ: TypeId) {
    let obj = ctx.new_object(Object {
        name: name.to_string(),
        kind,
        pkg: None,
        pos: Span::dummy(),
        typ,
        imported: None,
    });
    ctx.declare(ScopeId::UNIVERSE, name, obj);
}

/// Human-readable signatures for builtins, used when builtins are
/// proposed as candidates.
pub fn builtin_signature(name: &str) -> Option<&'static str> {
    Some(match name {
        "append" => "func(slice []Type, elems ...Type) []Type",
        "cap" => "func(v Type) int",
        "close" => "func(c chan<- Type)",
        "complex" => "func(r, i FloatType) ComplexType",
        "copy" => "func(dst, src []Type) int",
        "delete" => "func(m map[Type]Type1, key Type)",
        "imag" => "func(c ComplexType) FloatType",
        "len" => "func(v Type) int",
        "make" => "func(t Type, size ...IntegerType) Type",
        "new" => "func(Type) *Type",
        "panic" => "func(v interface{})",
        "print" => "func(args ...Type)",
        "println" => "func(args ...Type)",
        "real" => "func(c ComplexType) FloatType",
        "recover" => "func() interface{}",
        _ => return None,
    })
}
