//! Constraint solving.
//!
//! Implements unification extended with:
//! - One-directional subtyping (literals, tuples into arrays, extra call
//!   arguments, callbacks with fewer parameters)
//! - Partial application and variadic functions
//! - Structural records, tuples and unions
//! - Widening of unfrozen types into unions instead of failing

use log::trace;

use crate::error::{InferError, Result};
use crate::types::{FnParam, Subst, Substitutable, TFun, Type, TypeKind};

use super::constraint::Constraint;
use super::context::Context;
use super::member::resolve_member;
use super::widen::union_of;

/// Solve a list of constraints from scratch.
pub fn solve(ctx: &Context, constraints: &[Constraint]) -> Result<Subst> {
    solve_with(ctx, constraints, Subst::empty())
}

/// Solve constraints in order, on top of an existing substitution.
///
/// A constraint that reaches a member placeholder whose object is still a
/// variable is set aside and retried each time the substitution grows.
/// Whatever is still blocked at the end stays unchecked.
pub fn solve_with(ctx: &Context, constraints: &[Constraint], mut subst: Subst) -> Result<Subst> {
    let mut pending = Vec::new();
    for constraint in constraints {
        let constraint = constraint.apply_subst(&subst);
        trace!("solve {}", constraint);
        let s = unify_with(ctx, &constraint, &mut pending)?;
        subst = s.compose(&subst);
        subst = retry_pending(ctx, subst, &mut pending)?;
    }
    if !pending.is_empty() {
        trace!("{} constraints left on unresolved members", pending.len());
    }
    Ok(subst)
}

/// Retry set-aside constraints until none of them makes progress.
fn retry_pending(ctx: &Context, mut subst: Subst, pending: &mut Vec<Constraint>) -> Result<Subst> {
    loop {
        let mut progressed = false;
        for constraint in std::mem::take(pending) {
            let constraint = constraint.apply_subst(&subst);
            if is_blocked(ctx, &constraint)? {
                pending.push(constraint);
                continue;
            }
            trace!("resume {}", constraint);
            let s = unify_with(ctx, &constraint, pending)?;
            subst = s.compose(&subst);
            progressed = true;
        }
        if !progressed {
            return Ok(subst);
        }
    }
}

fn is_blocked(ctx: &Context, constraint: &Constraint) -> Result<bool> {
    let is_mem = |ty: &Type| matches!(ty.kind, TypeKind::Mem { .. });
    Ok(is_mem(&settle(ctx, &constraint.left)?) || is_mem(&settle(ctx, &constraint.right)?))
}

/// Unify two types. With `subtype` set, `left` only has to be usable where
/// `right` is expected.
///
/// Comparisons against unresolved member placeholders are skipped; use
/// [`solve`] to have them checked once the object is known.
pub fn unify(ctx: &Context, left: &Type, right: &Type, subtype: bool) -> Result<Subst> {
    let constraint = Constraint {
        left: left.clone(),
        right: right.clone(),
        subtype,
    };
    unify_with(ctx, &constraint, &mut Vec::new())
}

fn unify_with(
    ctx: &Context,
    constraint: &Constraint,
    pending: &mut Vec<Constraint>,
) -> Result<Subst> {
    let subtype = constraint.subtype;
    let left = settle(ctx, &constraint.left)?;
    let right = settle(ctx, &constraint.right)?;

    match (&left.kind, &right.kind) {
        (TypeKind::Var(_), TypeKind::Var(_)) if left.id == right.id => return Ok(Subst::empty()),
        (TypeKind::Var(_), _) => return bind(&left, &right),
        (_, TypeKind::Var(_)) => return bind(&right, &left),

        (TypeKind::Mem { object: o1, key: k1 }, TypeKind::Mem { object: o2, key: k2 })
            if k1 == k2 =>
        {
            return unify_with(ctx, &Constraint::equal((**o1).clone(), (**o2).clone()), pending);
        }
        (TypeKind::Mem { .. }, _) | (_, TypeKind::Mem { .. }) => {
            trace!("defer {} against {}", left, right);
            pending.push(Constraint {
                left: left.clone(),
                right: right.clone(),
                subtype,
            });
            return Ok(Subst::empty());
        }

        (TypeKind::Fun(a), TypeKind::Fun(b)) => {
            return unify_funcs(ctx, (&left, a), (&right, b), subtype, pending);
        }

        (TypeKind::Prim(a), TypeKind::Prim(b)) if a == b => return Ok(Subst::empty()),
        (TypeKind::Lit(a), TypeKind::Lit(b)) if a == b => return Ok(Subst::empty()),

        (TypeKind::Gen(a), TypeKind::Gen(b)) if a.name == b.name => {
            if a.args.len() != b.args.len() {
                return Err(mismatch(&left, a.args.len(), &right, b.args.len()));
            }
            let pairs = a.args.iter().cloned().zip(b.args.iter().cloned()).collect();
            return unify_pairs(ctx, pairs, subtype, pending);
        }

        (TypeKind::Union(a), TypeKind::Union(b)) if a.len() == b.len() => {
            return unify_unions(ctx, a, b, subtype, pending);
        }

        (TypeKind::Tuple(a), TypeKind::Tuple(b)) => {
            if a.len() != b.len() {
                return Err(mismatch(&left, a.len(), &right, b.len()));
            }
            let pairs = a.iter().cloned().zip(b.iter().cloned()).collect();
            return unify_pairs(ctx, pairs, subtype, pending);
        }

        (TypeKind::Rec(_), TypeKind::Rec(_)) => {
            return unify_records(ctx, &left, &right, subtype, pending);
        }

        (TypeKind::Tuple(elems), TypeKind::Gen(_)) if subtype => {
            if let Some(elem) = right.generic_arg("Array") {
                let pairs = elems.iter().map(|t| (t.clone(), elem.clone())).collect();
                return unify_pairs(ctx, pairs, true, pending);
            }
        }

        _ => {}
    }

    if subtype && is_subtype(&left, &right) {
        return Ok(Subst::empty());
    }

    // A union with an open member (`T | undefined` from indexing) takes
    // anything that fits none of its other members through that member.
    if subtype {
        if let TypeKind::Union(members) = &right.kind {
            if let Some(var) = members.iter().find(|m| m.is_var()) {
                return bind(var, &left);
            }
        }
    }

    widen(ctx, &left, &right, subtype)
}

/// Resolve a member placeholder whose object is no longer a variable.
pub fn settle(ctx: &Context, ty: &Type) -> Result<Type> {
    if let TypeKind::Mem { object, key } = &ty.kind {
        let object = settle(ctx, object)?;
        if let Some(resolved) = resolve_member(ctx, &object, key)? {
            return settle(ctx, &resolved);
        }
    }
    Ok(ty.clone())
}

/// Resolve every member placeholder within a type that can be resolved.
pub fn settle_deep(ctx: &Context, ty: &Type) -> Result<Type> {
    let rebuilt = Type {
        id: ty.id,
        frozen: ty.frozen,
        kind: ty.kind.try_map_children(|child| settle_deep(ctx, child))?,
    };
    settle(ctx, &rebuilt)
}

/// Bind a type variable to a type (with occurs check).
fn bind(var: &Type, ty: &Type) -> Result<Subst> {
    if ty.is_var() && ty.id == var.id {
        return Ok(Subst::empty());
    }

    if ty.free_vars().iter().any(|v| v.id == var.id) {
        return Err(InferError::InfiniteType {
            var: var.clone(),
            ty: ty.clone(),
        });
    }

    trace!("bind {} := {}", var, ty);
    Ok(Subst::singleton(var.id, ty.clone()))
}

/// Unify pairs in order, threading the substitution through.
fn unify_pairs(
    ctx: &Context,
    pairs: Vec<(Type, Type)>,
    subtype: bool,
    pending: &mut Vec<Constraint>,
) -> Result<Subst> {
    let mut subst = Subst::empty();
    for (left, right) in pairs {
        let constraint = Constraint {
            left: subst.apply(&left),
            right: subst.apply(&right),
            subtype,
        };
        let s = unify_with(ctx, &constraint, pending)?;
        subst = s.compose(&subst);
    }
    Ok(subst)
}

/// Unify a function value (`actual`) with the shape it is used at
/// (`expected`).
///
/// Parameters are contravariant: each expected parameter must be usable as
/// the corresponding actual one. Calls with fewer arguments than required
/// parameters are partial applications.
fn unify_funcs(
    ctx: &Context,
    (left, actual): (&Type, &TFun),
    (right, expected): (&Type, &TFun),
    subtype: bool,
    pending: &mut Vec<Constraint>,
) -> Result<Subst> {
    if actual.variadic && !expected.variadic {
        // Gather the trailing arguments into a tuple for the rest parameter.
        let fixed = actual.params.len().saturating_sub(1);
        if expected.params.len() >= fixed {
            let (head, tail) = expected.params.split_at(fixed);
            let mut params = head.to_vec();
            let rest_name = actual
                .params
                .last()
                .map(|p| p.name.clone())
                .unwrap_or_else(|| "rest".to_string());
            params.push(FnParam::new(
                rest_name,
                ctx.tuple(tail.iter().map(|p| p.ty.clone()).collect()),
            ));
            let folded = TFun {
                params,
                ret: expected.ret.clone(),
                variadic: false,
            };
            let fixed_actual = TFun {
                variadic: false,
                ..actual.clone()
            };
            return unify_funcs(ctx, (left, &fixed_actual), (right, &folded), subtype, pending);
        }
    }

    if expected.variadic && !actual.variadic {
        // A spread argument supplies every remaining parameter.
        let fixed = expected.params.len().saturating_sub(1);
        if actual.params.len() >= fixed {
            let elem = ctx.fresh();
            let mut pairs: Vec<(Type, Type)> = Vec::new();
            if let Some(spread) = expected.params.last() {
                pairs.push((spread.ty.clone(), ctx.array(elem.clone())));
            }
            for (i, param) in actual.params.iter().enumerate() {
                let arg = match expected.params.get(i) {
                    Some(arg) if i < fixed => arg.ty.clone(),
                    _ => elem.clone(),
                };
                pairs.push((arg, param.ty.clone()));
            }
            pairs.push((actual.ret.as_ref().clone(), expected.ret.as_ref().clone()));
            return unify_pairs(ctx, pairs, subtype, pending);
        }
    }

    let (na, nb) = (actual.params.len(), expected.params.len());
    let mut pairs: Vec<(Type, Type)> = expected
        .params
        .iter()
        .zip(&actual.params)
        .map(|(e, a)| (e.ty.clone(), a.ty.clone()))
        .collect();

    if nb < na {
        let missing = &actual.params[nb..];
        if missing.iter().all(|p| p.optional) {
            pairs.push((actual.ret.as_ref().clone(), expected.ret.as_ref().clone()));
        } else if !subtype {
            // Partial application only happens at call sites.
            return Err(mismatch(left, na, right, nb));
        } else {
            // Partial application: the call returns a function over the
            // parameters that were not supplied.
            let residual = ctx.stamp(TypeKind::Fun(TFun {
                params: missing.to_vec(),
                ret: actual.ret.clone(),
                variadic: actual.variadic,
            }));
            trace!("partial application, residual {}", residual);
            pairs.push((residual, expected.ret.as_ref().clone()));
        }
    } else if nb > na && !subtype {
        return Err(mismatch(left, na, right, nb));
    } else {
        // Extra arguments are ignored when subtyping.
        pairs.push((actual.ret.as_ref().clone(), expected.ret.as_ref().clone()));
    }

    unify_pairs(ctx, pairs, subtype, pending)
}

/// Unify two records. Key sets must match; the frozen side decides whether
/// a difference is reported as extra or as missing properties.
fn unify_records(
    ctx: &Context,
    left: &Type,
    right: &Type,
    subtype: bool,
    pending: &mut Vec<Constraint>,
) -> Result<Subst> {
    let (a, b) = match (&left.kind, &right.kind) {
        (TypeKind::Rec(a), TypeKind::Rec(b)) => (a, b),
        _ => unreachable!("unify_records called on non-records"),
    };

    let only_left: Vec<String> = a.keys().filter(|k| !b.contains_key(*k)).cloned().collect();
    if !only_left.is_empty() {
        return Err(if right.frozen {
            InferError::ExtraProperties {
                props: only_left,
                ty: left.clone(),
            }
        } else {
            InferError::MissingProperties {
                props: only_left,
                ty: right.clone(),
            }
        });
    }

    let only_right: Vec<String> = b.keys().filter(|k| !a.contains_key(*k)).cloned().collect();
    if !only_right.is_empty() {
        return Err(if left.frozen {
            InferError::ExtraProperties {
                props: only_right,
                ty: right.clone(),
            }
        } else {
            InferError::MissingProperties {
                props: only_right,
                ty: left.clone(),
            }
        });
    }

    let pairs = a
        .iter()
        .filter_map(|(k, t)| b.get(k).map(|other| (t.clone(), other.clone())))
        .collect();
    unify_pairs(ctx, pairs, subtype, pending)
}

/// Unify two unions of the same size. Equal members are paired first, the
/// rest by position.
fn unify_unions(
    ctx: &Context,
    a: &[Type],
    b: &[Type],
    subtype: bool,
    pending: &mut Vec<Constraint>,
) -> Result<Subst> {
    let mut used = vec![false; b.len()];
    let mut unmatched = Vec::new();
    for member in a {
        match (0..b.len()).find(|&i| !used[i] && member.equiv(&b[i])) {
            Some(i) => used[i] = true,
            None => unmatched.push(member.clone()),
        }
    }
    let rest = b
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(t, _)| t.clone());
    let pairs = unmatched.into_iter().zip(rest).collect();
    unify_pairs(ctx, pairs, subtype, pending)
}

/// Whether `sub` is usable where `sup` is expected, without binding
/// anything.
pub fn is_subtype(sub: &Type, sup: &Type) -> bool {
    if sub.equiv(sup) {
        return true;
    }

    match (&sub.kind, &sup.kind) {
        (TypeKind::Union(members), _) => members.iter().all(|m| is_subtype(m, sup)),
        (_, TypeKind::Union(members)) => members.iter().any(|m| is_subtype(sub, m)),

        (TypeKind::Lit(lit), TypeKind::Prim(prim)) => lit.prim() == *prim,

        (TypeKind::Tuple(a), TypeKind::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| is_subtype(x, y))
        }
        (TypeKind::Tuple(elems), TypeKind::Gen(_)) => match sup.generic_arg("Array") {
            Some(elem) => elems.iter().all(|t| is_subtype(t, elem)),
            None => false,
        },

        (TypeKind::Gen(a), TypeKind::Gen(b)) => {
            a.name == b.name
                && a.args.len() == b.args.len()
                && a.args.iter().zip(&b.args).all(|(x, y)| is_subtype(x, y))
        }

        (TypeKind::Rec(a), TypeKind::Rec(b)) => {
            a.len() == b.len()
                && b
                    .iter()
                    .all(|(k, t)| a.get(k).is_some_and(|own| is_subtype(own, t)))
        }

        (TypeKind::Fun(a), TypeKind::Fun(b)) => {
            a.params.len() <= b.params.len()
                && a.params
                    .iter()
                    .zip(&b.params)
                    .all(|(own, other)| is_subtype(&other.ty, &own.ty))
                && is_subtype(&a.ret, &b.ret)
        }

        _ => false,
    }
}

/// Reconcile two types that did not unify by replacing both with their
/// union. Frozen types are never replaced; a frozen side only absorbs the
/// other when it already covers it.
fn widen(ctx: &Context, left: &Type, right: &Type, subtype: bool) -> Result<Subst> {
    // Older nodes first, so members read in the order they were written.
    let members = if left.id <= right.id {
        vec![left.clone(), right.clone()]
    } else {
        vec![right.clone(), left.clone()]
    };
    let union = union_of(ctx, members);

    match (left.frozen, right.frozen) {
        (false, false) => {
            for side in [left, right] {
                if union.contains_id(side.id) {
                    return Err(InferError::InfiniteType {
                        var: side.clone(),
                        ty: union,
                    });
                }
            }
            trace!("widen {} and {} to {}", left, right, union);
            let mut subst = Subst::singleton(left.id, union.clone());
            subst.insert(right.id, union);
            Ok(subst)
        }
        (true, false) if union.equiv(left) => Ok(Subst::singleton(right.id, left.clone())),
        (false, true) if union.equiv(right) => Ok(Subst::singleton(left.id, right.clone())),
        _ if subtype => Err(InferError::SubtypingFailure {
            sub: left.clone(),
            sup: right.clone(),
        }),
        _ => Err(InferError::UnificationFail {
            left: left.clone(),
            right: right.clone(),
        }),
    }
}

fn mismatch(left: &Type, left_arity: usize, right: &Type, right_arity: usize) -> InferError {
    InferError::UnificationMismatch {
        left: left.clone(),
        right: right.clone(),
        left_arity,
        right_arity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::initial_env;
    use crate::infer::env::TypeEnv;
    use crate::types::{FnParam, Lit, MemberKey};

    fn ctx() -> Context {
        Context::new(TypeEnv::empty())
    }

    fn num(ctx: &Context, value: f64) -> Type {
        ctx.lit(Lit::Num(value))
    }

    fn fun(ctx: &Context, params: Vec<Type>, ret: Type) -> Type {
        ctx.positional_fun(params, ret, false)
    }

    #[test]
    fn test_bind_var() {
        let ctx = ctx();
        let a = ctx.fresh();
        let n = ctx.number();
        let s = unify(&ctx, &a, &n, false).unwrap();
        assert_eq!(s.apply(&a).to_string(), "number");
    }

    #[test]
    fn test_occurs_check() {
        let ctx = ctx();
        let a = ctx.fresh();
        let f = fun(&ctx, vec![a.clone()], ctx.number());
        let err = unify(&ctx, &a, &f, false).unwrap_err();
        assert!(matches!(err, InferError::InfiniteType { .. }));
    }

    #[test]
    fn test_literal_is_subtype_of_primitive() {
        let ctx = ctx();
        let five = num(&ctx, 5.0);
        let number = ctx.number().freeze();
        assert!(unify(&ctx, &five, &number, true).unwrap().is_empty());
        assert!(!is_subtype(&number, &five));
    }

    #[test]
    fn test_widening_unfrozen_literals() {
        let ctx = ctx();
        let five = num(&ctx, 5.0);
        let ten = num(&ctx, 10.0);
        let s = unify(&ctx, &five, &ten, false).unwrap();
        assert_eq!(s.apply(&five).to_string(), "5 | 10");
        assert_eq!(s.apply(&ten).to_string(), "5 | 10");
    }

    #[test]
    fn test_widening_into_frozen_primitive() {
        let ctx = ctx();
        let five = num(&ctx, 5.0);
        let number = ctx.number().freeze();
        let s = unify(&ctx, &five, &number, false).unwrap();
        assert_eq!(s.apply(&five).to_string(), "number");
        assert!(s.get(number.id).is_none());
    }

    #[test]
    fn test_frozen_rejects_widening() {
        let ctx = ctx();
        let t = ctx.lit(Lit::Bool(true));
        let number = ctx.number().freeze();
        let err = unify(&ctx, &t, &number, true).unwrap_err();
        assert!(matches!(err, InferError::SubtypingFailure { .. }));

        let err = unify(&ctx, &ctx.string().freeze(), &number, false).unwrap_err();
        assert!(matches!(err, InferError::UnificationFail { .. }));
    }

    #[test]
    fn test_extra_arguments_ignored_under_subtyping() {
        let ctx = ctx();
        let add = fun(&ctx, vec![ctx.number(), ctx.number()], ctx.number()).freeze();
        let r = ctx.fresh();
        let call = fun(&ctx, vec![num(&ctx, 1.0), num(&ctx, 2.0), num(&ctx, 3.0)], r.clone());
        let s = unify(&ctx, &add, &call, true).unwrap();
        assert_eq!(s.apply(&r).to_string(), "number");

        let err = unify(&ctx, &add, &call, false).unwrap_err();
        assert!(matches!(
            err,
            InferError::UnificationMismatch { left_arity: 2, right_arity: 3, .. }
        ));
    }

    #[test]
    fn test_partial_application() {
        let ctx = ctx();
        let add = ctx
            .fun(
                vec![
                    FnParam::new("left", ctx.number()),
                    FnParam::new("right", ctx.number()),
                ],
                ctx.number(),
            )
            .freeze();
        let r = ctx.fresh();
        let call = fun(&ctx, vec![num(&ctx, 5.0)], r.clone());
        let s = unify(&ctx, &add, &call, true).unwrap();
        assert_eq!(s.apply(&r).to_string(), "(right: number) => number");
    }

    #[test]
    fn test_optional_parameters_may_be_omitted() {
        let ctx = ctx();
        let f = ctx
            .fun(
                vec![
                    FnParam::new("x", ctx.number()),
                    FnParam::optional("y", ctx.number()),
                ],
                ctx.string(),
            )
            .freeze();
        let r = ctx.fresh();
        let call = fun(&ctx, vec![num(&ctx, 1.0)], r.clone());
        let s = unify(&ctx, &f, &call, true).unwrap();
        assert_eq!(s.apply(&r).to_string(), "string");
    }

    #[test]
    fn test_variadic_callee() {
        let ctx = ctx();
        let sum = ctx
            .variadic_fun(
                vec![FnParam::new("nums", ctx.array(ctx.number()))],
                ctx.number(),
            )
            .freeze();
        let r = ctx.fresh();
        let call = fun(&ctx, vec![num(&ctx, 1.0), num(&ctx, 2.0)], r.clone());
        let s = unify(&ctx, &sum, &call, true).unwrap();
        assert_eq!(s.apply(&r).to_string(), "number");

        let bad = fun(&ctx, vec![ctx.lit(Lit::Str("x".into()))], ctx.fresh());
        assert!(unify(&ctx, &sum, &bad, true).is_err());
    }

    #[test]
    fn test_spread_argument() {
        let ctx = ctx();
        let add = fun(&ctx, vec![ctx.number(), ctx.number()], ctx.number()).freeze();
        let r = ctx.fresh();
        let call = ctx.positional_fun(vec![ctx.array(ctx.number()).freeze()], r.clone(), true);
        let s = unify(&ctx, &add, &call, true).unwrap();
        assert_eq!(s.apply(&r).to_string(), "number");
    }

    #[test]
    fn test_callback_with_fewer_parameters() {
        let ctx = ctx();
        let u = ctx.fresh();
        let declared = fun(
            &ctx,
            vec![ctx.string(), ctx.number()],
            u.clone(),
        )
        .freeze();
        let elem = ctx.fresh();
        let provided = fun(&ctx, vec![elem.clone()], num(&ctx, 5.0));
        // the provided callback is used where the declared one is expected
        let s = unify(&ctx, &provided, &declared, true).unwrap();
        assert_eq!(s.apply(&elem).to_string(), "string");
        assert_eq!(s.apply(&u).to_string(), "5");
    }

    #[test]
    fn test_tuple_into_array() {
        let ctx = ctx();
        let tuple = ctx.tuple(vec![num(&ctx, 1.0), num(&ctx, 2.0)]);
        let array = ctx.array(ctx.number()).freeze();
        assert!(unify(&ctx, &tuple, &array, true).is_ok());

        let strings = ctx.array(ctx.string()).freeze();
        assert!(unify(&ctx, &tuple, &strings, true).is_err());
    }

    #[test]
    fn test_tuple_length_mismatch() {
        let ctx = ctx();
        let a = ctx.tuple(vec![ctx.number()]);
        let b = ctx.tuple(vec![ctx.number(), ctx.number()]);
        let err = unify(&ctx, &a, &b, false).unwrap_err();
        assert!(matches!(err, InferError::UnificationMismatch { .. }));
    }

    #[test]
    fn test_generic_args_unify() {
        let ctx = ctx();
        let a = ctx.fresh();
        let left = ctx.array(a.clone());
        let right = ctx.array(ctx.string());
        let s = unify(&ctx, &left, &right, false).unwrap();
        assert_eq!(s.apply(&a).to_string(), "string");
    }

    #[test]
    fn test_records_extra_and_missing() {
        let ctx = ctx();
        let expected = ctx
            .rec([("foo", ctx.number()), ("bar", ctx.string())])
            .freeze();

        let extra = ctx.rec([
            ("foo", num(&ctx, 5.0)),
            ("bar", ctx.lit(Lit::Str("x".into()))),
            ("baz", ctx.lit(Lit::Bool(true))),
        ]);
        match unify(&ctx, &extra, &expected, true).unwrap_err() {
            InferError::ExtraProperties { props, .. } => assert_eq!(props, vec!["baz"]),
            other => panic!("unexpected error: {:?}", other),
        }

        let missing = ctx.rec([("foo", num(&ctx, 5.0))]);
        match unify(&ctx, &missing, &expected, true).unwrap_err() {
            InferError::MissingProperties { props, .. } => assert_eq!(props, vec!["bar"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_records_bind_properties() {
        let ctx = ctx();
        let (a, b) = (ctx.fresh(), ctx.fresh());
        let expected = ctx.rec([("foo", a.clone()), ("bar", b.clone())]);
        let given = ctx.rec([
            ("bar", ctx.lit(Lit::Str("x".into()))),
            ("foo", num(&ctx, 5.0)),
        ]);
        let s = unify(&ctx, &given, &expected, true).unwrap();
        assert_eq!(s.apply(&a).to_string(), "5");
        assert_eq!(s.apply(&b).to_string(), "\"x\"");
    }

    #[test]
    fn test_unions_match_out_of_order() {
        let ctx = ctx();
        let a = ctx.fresh();
        let left = ctx.union(vec![ctx.string(), a.clone()]);
        let right = ctx.union(vec![ctx.number(), ctx.string()]);
        let s = unify(&ctx, &left, &right, false).unwrap();
        assert_eq!(s.apply(&a).to_string(), "number");
    }

    #[test]
    fn test_subtype_binds_var_in_union() {
        let ctx = ctx();
        let a = ctx.fresh();
        let union = ctx.union(vec![ctx.undefined(), a.clone()]);
        let s = unify(&ctx, &ctx.number(), &union, true).unwrap();
        assert_eq!(s.apply(&a).to_string(), "number");
    }

    #[test]
    fn test_member_placeholder_settles() {
        let ctx = ctx();
        let rec = ctx.rec([("x", ctx.number())]);
        let mem = ctx.mem(rec, MemberKey::Name("x".into()));
        let r = ctx.fresh();
        let s = unify(&ctx, &r, &mem, false).unwrap();
        assert_eq!(s.apply(&r).to_string(), "number");
    }

    #[test]
    fn test_member_placeholders_with_same_key_unify_objects() {
        let ctx = ctx();
        let (a, b) = (ctx.fresh(), ctx.fresh());
        let key = MemberKey::Name("foo".into());
        let left = ctx.mem(a.clone(), key.clone());
        let right = ctx.mem(b.clone(), key);
        let s = unify(&ctx, &left, &right, false).unwrap();
        assert_eq!(s.apply(&a).id, s.apply(&b).id);
        assert!(s.apply(&a).is_var());
    }

    #[test]
    fn test_member_placeholder_on_alias_settles() {
        let base = ctx();
        let ctx = base.with_env(initial_env(&base));
        let strings = ctx.array(ctx.string());
        let length = ctx.mem(strings, MemberKey::Name("length".into()));
        let r = ctx.fresh();
        let s = unify(&ctx, &length, &r, false).unwrap();
        assert_eq!(s.apply(&r).to_string(), "number");

        let five = num(&ctx, 5.0);
        assert!(unify(&ctx, &length, &five, false).is_ok());
    }

    #[test]
    fn test_unresolved_member_is_not_widened() {
        let ctx = ctx();
        let obj = ctx.fresh();
        let foo = ctx.mem(obj, MemberKey::Name("foo".into()));
        let five = num(&ctx, 5.0);
        let s = unify(&ctx, &foo, &five, false).unwrap();
        assert!(s.is_empty());
        assert_eq!(s.apply(&five).to_string(), "5");
    }

    #[test]
    fn test_member_constraint_waits_for_object() {
        let ctx = ctx();
        let obj = ctx.fresh();
        let foo = ctx.mem(obj.clone(), MemberKey::Name("foo".into()));
        let r = ctx.fresh();
        let constraints = |value: Type| {
            vec![
                Constraint::subtype(foo.clone(), ctx.number().freeze()),
                Constraint::equal(r.clone(), foo.clone()),
                Constraint::equal(obj.clone(), ctx.rec([("foo", value)])),
            ]
        };

        let s = solve(&ctx, &constraints(num(&ctx, 3.0))).unwrap();
        assert_eq!(settle(&ctx, &s.apply(&r)).unwrap().to_string(), "3");

        let err = solve(&ctx, &constraints(ctx.lit(Lit::Str("x".into())))).unwrap_err();
        assert!(matches!(err, InferError::SubtypingFailure { .. }));
    }

    #[test]
    fn test_solve_composes_in_order() {
        let ctx = ctx();
        let (a, b) = (ctx.fresh(), ctx.fresh());
        let constraints = vec![
            Constraint::equal(a.clone(), b.clone()),
            Constraint::equal(b.clone(), ctx.string()),
        ];
        let s = solve(&ctx, &constraints).unwrap();
        assert_eq!(s.apply(&a).to_string(), "string");
        assert_eq!(s.apply(&b).to_string(), "string");
    }

    #[test]
    fn test_is_subtype_functions() {
        let ctx = ctx();
        let narrow = fun(&ctx, vec![ctx.number()], num(&ctx, 5.0));
        let wide = fun(&ctx, vec![num(&ctx, 1.0), ctx.string()], ctx.number());
        assert!(is_subtype(&narrow, &wide));
        assert!(!is_subtype(&wide, &narrow));
    }
}
