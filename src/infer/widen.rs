//! Union normalization used when widening.

use crate::types::{Lit, Prim, Type, TypeKind};

use super::context::Context;

/// The normalized union of two types.
pub fn compute_union(ctx: &Context, a: &Type, b: &Type) -> Type {
    union_of(ctx, vec![a.clone(), b.clone()])
}

/// Build a normalized union of `types`.
///
/// Nested unions are flattened, duplicates removed, `true | false` becomes
/// `boolean`, and literals are dropped when their primitive is also present.
/// A single remaining member is returned as is; an empty union is a fresh
/// variable.
pub fn union_of(ctx: &Context, types: Vec<Type>) -> Type {
    let mut flat = Vec::new();
    flatten(types, &mut flat);

    let mut members = dedupe(flat);
    collapse_booleans(ctx, &mut members);

    let prims: Vec<Prim> = members
        .iter()
        .filter_map(|m| match m.kind {
            TypeKind::Prim(p) => Some(p),
            _ => None,
        })
        .collect();
    members.retain(|m| match &m.kind {
        TypeKind::Lit(lit) => !prims.contains(&lit.prim()),
        _ => true,
    });
    let mut members = dedupe(members);

    match members.len() {
        0 => ctx.fresh(),
        1 => restamp(ctx, members.remove(0)),
        _ => ctx.union(members.into_iter().map(|m| restamp(ctx, m)).collect()),
    }
}

fn flatten(types: Vec<Type>, out: &mut Vec<Type>) {
    for ty in types {
        match ty.kind {
            TypeKind::Union(members) => flatten(members, out),
            _ => out.push(ty),
        }
    }
}

fn dedupe(types: Vec<Type>) -> Vec<Type> {
    let mut out: Vec<Type> = Vec::with_capacity(types.len());
    for ty in types {
        if !out.iter().any(|seen| seen.equiv(&ty)) {
            out.push(ty);
        }
    }
    out
}

fn collapse_booleans(ctx: &Context, members: &mut Vec<Type>) {
    let is_bool =
        |m: &Type, value: bool| matches!(&m.kind, TypeKind::Lit(Lit::Bool(b)) if *b == value);
    let has_true = members.iter().any(|m| is_bool(m, true));
    let has_false = members.iter().any(|m| is_bool(m, false));
    if !(has_true && has_false) {
        return;
    }

    let first = members
        .iter()
        .position(|m| matches!(m.kind, TypeKind::Lit(Lit::Bool(_))));
    if let Some(first) = first {
        members[first] = ctx.boolean();
        let mut i = 0;
        members.retain(|m| {
            let keep = i == first || !matches!(m.kind, TypeKind::Lit(Lit::Bool(_)));
            i += 1;
            keep
        });
    }
}

/// Members get their own ids so that rebinding a widened node never
/// touches the union it was widened into.
fn restamp(ctx: &Context, ty: Type) -> Type {
    if ty.is_var() {
        return ty;
    }
    Type {
        id: ctx.next_id(),
        frozen: ty.frozen,
        kind: ty.kind,
    }
}
