//! Selector member enumeration.
//!
//! Given a typed expression, lists every identifier that may legally
//! follow a dot after it. The rules are surprisingly nuanced: method
//! sets differ between types, values, and addressable values; embedded
//! fields promote members level by level with shadowing; equally deep
//! conflicting members are ambiguous and must be suppressed; and
//! embedding graphs can be cyclic.

use rustc_hash::{FxHashMap, FxHashSet};

use goco_checker::{EvalMode, ObjId, TypeAndValue, TypeCtx, TypeData, TypeId};

/// Per-identifier walk state.
///
/// `Obj` is a live candidate for the current embedding level. `Consumed`
/// covers both ambiguity and already-emitted names; either way, deeper
/// levels must not reintroduce the identifier.
#[derive(Copy, Clone, Debug)]
enum Slot {
    Obj(ObjId),
    Consumed,
}

/// Enumerate the selectable members of an evaluated expression.
///
/// Returns false when the expression is neither a type nor a value.
/// Method expressions (selection on a type) are restricted to named
/// types and pointers to named types, so anything else yields nothing.
pub fn walk(ctx: &TypeCtx, tv: &TypeAndValue, visit: &mut dyn FnMut(ObjId)) -> bool {
    match tv.mode {
        EvalMode::Type => {
            if ctx.named_of(tv.typ).is_some() {
                walk_members(ctx, tv.typ, false, false, visit);
            }
            true
        }
        EvalMode::Value { addressable } => {
            walk_members(ctx, tv.typ, addressable, true, visit);
            true
        }
        EvalMode::Invalid => false,
    }
}

fn walk_members(
    ctx: &TypeCtx,
    typ0: TypeId,
    addable0: bool,
    value: bool,
    visit: &mut dyn FnMut(ObjId),
) {
    let mut found: FxHashMap<String, Slot> = FxHashMap::default();
    let mut visited: FxHashSet<TypeId> = FxHashSet::default();

    let mut add = |found: &mut FxHashMap<String, Slot>, id: String, obj: Option<ObjId>| {
        match found.get(&id) {
            None => {
                found.insert(id, obj.map(Slot::Obj).unwrap_or(Slot::Consumed));
            }
            Some(Slot::Obj(_)) => {
                // Second distinct hit at this level: ambiguous selector.
                found.insert(id, Slot::Consumed);
            }
            Some(Slot::Consumed) => {}
        }
    };

    let mut cur: Vec<(TypeId, bool)> = vec![(typ0, addable0)];
    let mut next: Vec<(TypeId, bool)> = Vec::new();

    loop {
        if cur.is_empty() {
            // Level boundary: flush live objects in a stable order, then
            // replace them with the consumed sentinel so deeper levels
            // are shadowed. Flushing between levels is what makes
            // equal-depth ambiguity detection correct.
            let mut live: Vec<(String, ObjId)> = found
                .iter()
                .filter_map(|(id, slot)| match slot {
                    Slot::Obj(obj) => Some((id.clone(), *obj)),
                    Slot::Consumed => None,
                })
                .collect();
            live.sort_by(|a, b| a.0.cmp(&b.0));
            for (id, obj) in live {
                visit(obj);
                found.insert(id, Slot::Consumed);
            }

            // Move unvisited embedded types into the current level.
            // Embedding recursion can only happen through named types
            // (or pointers to them), so the visited set of named types
            // is all the cycle detection needed.
            for item in next.drain(..) {
                match ctx.named_of(item.0) {
                    Some(named) if visited.contains(&named) => {}
                    Some(_) => cur.push(item),
                    // Broken code can embed unnamed types; drop them.
                    None => {}
                }
            }

            if cur.is_empty() {
                break;
            }
        }

        let (now_typ, now_addable) = cur.remove(0);

        // Methods declared on a named type. Going through a pointer
        // makes the receiver addressable.
        {
            let (base, addable) = match ctx.type_data(now_typ) {
                TypeData::Pointer { elem } => (*elem, true),
                _ => (now_typ, now_addable),
            };
            if let TypeData::Named { methods, .. } = ctx.type_data(base) {
                visited.insert(base);
                for &m in methods {
                    let id = ctx.obj_sel_key(m);
                    if !addable && has_pointer_receiver(ctx, m) {
                        // Not callable here, but it still shadows
                        // same-named members of deeper embedded fields.
                        add(&mut found, id, None);
                        continue;
                    }
                    add(&mut found, id, Some(m));
                }
            }
        }

        // Struct fields and interface methods on the underlying type.
        {
            let mut under = ctx.underlying(now_typ);
            let mut addable = now_addable;
            let mut through_ptr = false;
            if let TypeData::Pointer { elem } = ctx.type_data(under) {
                under = ctx.underlying(*elem);
                addable = true;
                through_ptr = true;
            }
            match ctx.type_data(under) {
                TypeData::Interface { methods } => {
                    // A pointer to an interface has no methods.
                    if !through_ptr {
                        for &m in methods {
                            add(&mut found, ctx.obj_sel_key(m), Some(m));
                        }
                    }
                }
                TypeData::Struct { fields } => {
                    for f in fields {
                        if f.embedded {
                            next.push((ctx.obj(f.obj).typ, addable));
                        }
                        let id = ctx.obj_sel_key(f.obj);
                        if value {
                            add(&mut found, id, Some(f.obj));
                        } else {
                            // Fields are not selectable in method
                            // expression form.
                            add(&mut found, id, None);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

fn has_pointer_receiver(ctx: &TypeCtx, method: ObjId) -> bool {
    match ctx.type_data(ctx.obj(method).typ) {
        TypeData::Signature { recv: Some(r), .. } => {
            matches!(ctx.type_data(*r), TypeData::Pointer { .. })
        }
        _ => false,
    }
}
