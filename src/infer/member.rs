//! Member access resolution.
//!
//! Resolves the type of `object.key` once the object's shape is known.
//! Primitives and generic types go through their alias in the environment:
//! `string` for string values, `Array` for arrays and tuples, and so on.

use std::collections::HashMap;

use log::trace;

use crate::error::{InferError, Result};
use crate::types::{MemberKey, Prim, Substitutable, TGen, Type, TypeId, TypeKind};

use super::context::Context;
use super::widen::union_of;

/// The type of `key` on `object`, or `None` while `object` is still a
/// type variable.
pub fn resolve_member(ctx: &Context, object: &Type, key: &MemberKey) -> Result<Option<Type>> {
    trace!("resolve_member {} on {}", key, object);
    match &object.kind {
        TypeKind::Var(_) => Ok(None),

        TypeKind::Rec(props) => props
            .get(&key.as_record_key())
            .cloned()
            .map(Some)
            .ok_or_else(|| InferError::PropertyMissing {
                key: key.clone(),
                ty: object.clone(),
            }),

        TypeKind::Tuple(types) => match key {
            MemberKey::Index(index) => types
                .get(*index)
                .cloned()
                .map(Some)
                .ok_or(InferError::IndexOutOfBounds {
                    index: *index,
                    len: types.len(),
                }),
            MemberKey::Name(_) => {
                let array = ctx.array(union_of(ctx, types.clone()));
                resolve_member(ctx, &array, key)
            }
        },

        TypeKind::Prim(prim) => resolve_on_prim(ctx, *prim, object, key),
        TypeKind::Lit(lit) => resolve_on_prim(ctx, lit.prim(), object, key),

        TypeKind::Gen(generic) => {
            if let (Some(elem), MemberKey::Index(_)) = (object.generic_arg("Array"), key) {
                // Indexing may run past the end.
                return Ok(Some(union_of(ctx, vec![elem.clone(), ctx.undefined()])));
            }
            resolve_on_alias(ctx, generic, key)
                .map_err(|err| blame(err, object))
                .map(Some)
        }

        TypeKind::Fun(_) | TypeKind::Union(_) | TypeKind::Mem { .. } => {
            Err(InferError::UnsupportedMemberAccess {
                key: key.clone(),
                ty: object.clone(),
            })
        }
    }
}

fn resolve_on_prim(
    ctx: &Context,
    prim: Prim,
    object: &Type,
    key: &MemberKey,
) -> Result<Option<Type>> {
    let missing = || InferError::PropertyMissing {
        key: key.clone(),
        ty: object.clone(),
    };
    let scheme = ctx.env.lookup(prim.name()).ok_or_else(missing)?;
    let ty = ctx.instantiate(scheme);
    resolve_member(ctx, &ty, key).map_err(|err| blame(err, object))
}

/// Expand a generic alias with its arguments and look the key up in the
/// expansion.
fn resolve_on_alias(ctx: &Context, generic: &TGen, key: &MemberKey) -> Result<Type> {
    let scheme = ctx
        .env
        .lookup(&generic.name)
        .ok_or_else(|| InferError::UnknownType {
            name: generic.name.clone(),
        })?;

    if scheme.qualifiers.len() != generic.args.len() {
        return Err(InferError::TypeParamArityMismatch {
            name: generic.name.clone(),
            expected: scheme.qualifiers.len(),
            found: generic.args.len(),
        });
    }

    let mut mapping: HashMap<TypeId, Type> = scheme
        .qualifiers
        .iter()
        .zip(&generic.args)
        .map(|(q, arg)| (q.id, arg.clone()))
        .collect();
    // Method-level type parameters (the `U` of `map`) are fresh per access.
    for var in scheme.ty.free_vars() {
        mapping.entry(var.id).or_insert_with(|| ctx.fresh());
    }

    let expanded = ctx.copy_with(&scheme.ty, &mapping);
    match resolve_member(ctx, &expanded, key)? {
        Some(ty) => Ok(ty),
        None => Ok(ctx.mem(expanded, key.clone())),
    }
}

/// Report a missing property against the type the user wrote rather than
/// its expansion.
fn blame(err: InferError, object: &Type) -> InferError {
    match err {
        InferError::PropertyMissing { key, .. } => InferError::PropertyMissing {
            key,
            ty: object.clone(),
        },
        other => other,
    }
}
