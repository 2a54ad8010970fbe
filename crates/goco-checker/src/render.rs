//! Human-readable type rendering.
//!
//! Matches the Go type stringer's conventions closely enough for an
//! editor tooltip: parameter names are kept, variadics render as `...T`,
//! and named types are qualified through a caller-supplied callback so
//! the local package's name can be omitted.

use crate::ctx::{PkgId, TypeCtx};
use crate::types::{ChanDir, Param, TypeData, TypeId};

/// Render a type. `qualify` returns the prefix for a package's named
/// types, or `None` to leave them unqualified.
pub fn type_string(
    ctx: &TypeCtx,
    id: TypeId,
    qualify: &dyn Fn(PkgId) -> Option<String>,
) -> String {
    render(ctx, id, qualify, 8)
}

fn render(ctx: &TypeCtx, id: TypeId, qualify: &dyn Fn(PkgId) -> Option<String>, depth: u8) -> String {
    if depth == 0 {
        return "...".to_string();
    }
    match ctx.type_data(id) {
        TypeData::Invalid => "invalid type".to_string(),
        TypeData::Basic(kind) => kind.name().to_string(),
        TypeData::Named { obj, .. } => {
            let o = ctx.obj(*obj);
            match o.pkg.and_then(|p| qualify(p)) {
                Some(prefix) => format!("{prefix}.{}", o.name),
                None => o.name.clone(),
            }
        }
        TypeData::Pointer { elem } => format!("*{}", render(ctx, *elem, qualify, depth - 1)),
        TypeData::Slice { elem } => format!("[]{}", render(ctx, *elem, qualify, depth - 1)),
        TypeData::Array { len, elem } => {
            let elem = render(ctx, *elem, qualify, depth - 1);
            match len {
                Some(n) => format!("[{n}]{elem}"),
                None => format!("[?]{elem}"),
            }
        }
        TypeData::Map { key, value } => format!(
            "map[{}]{}",
            render(ctx, *key, qualify, depth - 1),
            render(ctx, *value, qualify, depth - 1)
        ),
        TypeData::Chan { dir, elem } => {
            let elem = render(ctx, *elem, qualify, depth - 1);
            match dir {
                ChanDir::Both => format!("chan {elem}"),
                ChanDir::Send => format!("chan<- {elem}"),
                ChanDir::Recv => format!("<-chan {elem}"),
            }
        }
        TypeData::Signature {
            params,
            results,
            variadic,
            ..
        } => format!(
            "func{}",
            signature_string(ctx, params, results, *variadic, qualify, depth)
        ),
        TypeData::Struct { fields } => {
            let mut parts = Vec::with_capacity(fields.len());
            for f in fields {
                let o = ctx.obj(f.obj);
                let t = render(ctx, o.typ, qualify, depth - 1);
                if f.embedded {
                    parts.push(t);
                } else {
                    parts.push(format!("{} {t}", o.name));
                }
            }
            format!("struct{{{}}}", parts.join("; "))
        }
        TypeData::Interface { methods } => {
            let mut parts = Vec::with_capacity(methods.len());
            for &m in methods {
                let o = ctx.obj(m);
                if let TypeData::Signature {
                    params,
                    results,
                    variadic,
                    ..
                } = ctx.type_data(o.typ)
                {
                    parts.push(format!(
                        "{}{}",
                        o.name,
                        signature_string(ctx, params, results, *variadic, qualify, depth)
                    ));
                } else {
                    parts.push(o.name.clone());
                }
            }
            format!("interface{{{}}}", parts.join("; "))
        }
        TypeData::Tuple { elems } => {
            let parts: Vec<String> = elems
                .iter()
                .map(|&e| render(ctx, e, qualify, depth - 1))
                .collect();
            format!("({})", parts.join(", "))
        }
    }
}

/// Renders `(a int, b ...string) (int, error)`: everything after the
/// `func` keyword, shared by function and interface-method rendering.
pub fn signature_string(
    ctx: &TypeCtx,
    params: &[Param],
    results: &[Param],
    variadic: bool,
    qualify: &dyn Fn(PkgId) -> Option<String>,
    depth: u8,
) -> String {
    let mut out = String::from("(");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let last = i + 1 == params.len();
        let t = if variadic && last {
            // The slice wrapper renders back to its spread form.
            match ctx.type_data(p.typ) {
                TypeData::Slice { elem } => format!("...{}", render(ctx, *elem, qualify, depth - 1)),
                _ => format!("...{}", render(ctx, p.typ, qualify, depth - 1)),
            }
        } else {
            render(ctx, p.typ, qualify, depth - 1)
        };
        if p.name.is_empty() {
            out.push_str(&t);
        } else {
            out.push_str(&format!("{} {t}", p.name));
        }
    }
    out.push(')');
    match results.len() {
        0 => {}
        1 if results[0].name.is_empty() => {
            out.push(' ');
            out.push_str(&render(ctx, results[0].typ, qualify, depth - 1));
        }
        _ => {
            let parts: Vec<String> = results
                .iter()
                .map(|r| {
                    let t = render(ctx, r.typ, qualify, depth - 1);
                    if r.name.is_empty() {
                        t
                    } else {
                        format!("{} {t}", r.name)
                    }
                })
                .collect();
            out.push_str(&format!(" ({})", parts.join(", ")));
        }
    }
    out
}
