//! Expression annotation and constraint generation.
//!
//! Walks an expression once, giving every node a type (fresh, or looked up
//! and instantiated) and recording the constraints between those types.
//! Solving happens afterwards, except where a node's shape has to be known
//! right away (`await`, spreads, member access), in which case the
//! constraints gathered so far are solved to peek at it.

use std::collections::HashMap;
use std::convert::Infallible;

use indexmap::{IndexMap, IndexSet};

use crate::ast::{Expr, Literal, Param};
use crate::error::{InferError, Result};
use crate::types::{FnParam, MemberKey, Scheme, Subst, Substitutable, TFun, TVar, Type, TypeKind};

use super::constraint::Constraint;
use super::context::Context;
use super::member::resolve_member;
use super::unify::solve;

/// An expression with the type of every node.
#[derive(Clone, Debug)]
pub struct TypedExpr {
    pub ty: Type,
    pub kind: TypedKind,
}

#[derive(Clone, Debug)]
pub enum TypedKind {
    Lit(Literal),
    Ident(String),
    Lam {
        params: Vec<String>,
        body: Box<TypedExpr>,
        is_async: bool,
    },
    App {
        func: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    Let {
        name: String,
        value: Box<TypedExpr>,
        body: Box<TypedExpr>,
    },
    Fix(Box<TypedExpr>),
    If {
        cond: Box<TypedExpr>,
        then: Box<TypedExpr>,
        else_: Box<TypedExpr>,
    },
    Await(Box<TypedExpr>),
    Rec(Vec<(String, TypedExpr)>),
    Tuple(Vec<TypedExpr>),
    Mem {
        object: Box<TypedExpr>,
        key: MemberKey,
    },
    Rest(Box<TypedExpr>),
    TaggedTemplate {
        tag: String,
        quasis: Vec<String>,
        exprs: Vec<TypedExpr>,
    },
}

impl TypedExpr {
    fn new(ty: Type, kind: TypedKind) -> Self {
        TypedExpr { ty, kind }
    }

    /// Visit this node and every node below it.
    pub fn walk(&self, f: &mut impl FnMut(&TypedExpr)) {
        f(self);
        match &self.kind {
            TypedKind::Lit(_) | TypedKind::Ident(_) => {}
            TypedKind::Lam { body, .. } => body.walk(f),
            TypedKind::App { func, args } => {
                func.walk(f);
                args.iter().for_each(|a| a.walk(f));
            }
            TypedKind::Let { value, body, .. } => {
                value.walk(f);
                body.walk(f);
            }
            TypedKind::Fix(inner) | TypedKind::Await(inner) | TypedKind::Rest(inner) => {
                inner.walk(f)
            }
            TypedKind::If { cond, then, else_ } => {
                cond.walk(f);
                then.walk(f);
                else_.walk(f);
            }
            TypedKind::Rec(props) => props.iter().for_each(|(_, v)| v.walk(f)),
            TypedKind::Tuple(elems) => elems.iter().for_each(|e| e.walk(f)),
            TypedKind::Mem { object, .. } => object.walk(f),
            TypedKind::TaggedTemplate { exprs, .. } => exprs.iter().for_each(|e| e.walk(f)),
        }
    }

    /// Rebuild the tree with `f` applied to the type of every node.
    pub fn try_map_types<E, F>(&self, f: &mut F) -> std::result::Result<TypedExpr, E>
    where
        F: FnMut(&Type) -> std::result::Result<Type, E>,
    {
        let kind = match &self.kind {
            TypedKind::Lit(lit) => TypedKind::Lit(lit.clone()),
            TypedKind::Ident(name) => TypedKind::Ident(name.clone()),
            TypedKind::Lam {
                params,
                body,
                is_async,
            } => TypedKind::Lam {
                params: params.clone(),
                body: Box::new(body.try_map_types(f)?),
                is_async: *is_async,
            },
            TypedKind::App { func, args } => TypedKind::App {
                func: Box::new(func.try_map_types(f)?),
                args: map_all(args, f)?,
            },
            TypedKind::Let { name, value, body } => TypedKind::Let {
                name: name.clone(),
                value: Box::new(value.try_map_types(f)?),
                body: Box::new(body.try_map_types(f)?),
            },
            TypedKind::Fix(inner) => TypedKind::Fix(Box::new(inner.try_map_types(f)?)),
            TypedKind::If { cond, then, else_ } => TypedKind::If {
                cond: Box::new(cond.try_map_types(f)?),
                then: Box::new(then.try_map_types(f)?),
                else_: Box::new(else_.try_map_types(f)?),
            },
            TypedKind::Await(inner) => TypedKind::Await(Box::new(inner.try_map_types(f)?)),
            TypedKind::Rec(props) => TypedKind::Rec(
                props
                    .iter()
                    .map(|(k, v)| v.try_map_types(&mut *f).map(|v| (k.clone(), v)))
                    .collect::<std::result::Result<_, E>>()?,
            ),
            TypedKind::Tuple(elems) => TypedKind::Tuple(map_all(elems, f)?),
            TypedKind::Mem { object, key } => TypedKind::Mem {
                object: Box::new(object.try_map_types(f)?),
                key: key.clone(),
            },
            TypedKind::Rest(inner) => TypedKind::Rest(Box::new(inner.try_map_types(f)?)),
            TypedKind::TaggedTemplate { tag, quasis, exprs } => TypedKind::TaggedTemplate {
                tag: tag.clone(),
                quasis: quasis.clone(),
                exprs: map_all(exprs, f)?,
            },
        };
        Ok(TypedExpr::new(f(&self.ty)?, kind))
    }
}

fn map_all<E, F>(exprs: &[TypedExpr], f: &mut F) -> std::result::Result<Vec<TypedExpr>, E>
where
    F: FnMut(&Type) -> std::result::Result<Type, E>,
{
    exprs.iter().map(|e| e.try_map_types(&mut *f)).collect()
}

impl Substitutable for TypedExpr {
    fn apply_subst(&self, subst: &Subst) -> Self {
        let mapped = self.try_map_types(&mut |ty| Ok::<_, Infallible>(ty.apply_subst(subst)));
        match mapped {
            Ok(expr) => expr,
            Err(never) => match never {},
        }
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        let mut vars = IndexSet::new();
        self.walk(&mut |e| vars.extend(e.ty.free_vars()));
        vars
    }
}

/// Annotate `expr`, appending its constraints to `constraints`.
pub fn annotate_into(
    ctx: &Context,
    expr: &Expr,
    constraints: &mut Vec<Constraint>,
) -> Result<TypedExpr> {
    match expr {
        Expr::Lit(literal) => Ok(TypedExpr::new(
            ctx.literal(literal),
            TypedKind::Lit(literal.clone()),
        )),

        Expr::Ident(name) => Ok(TypedExpr::new(
            ctx.lookup(name)?,
            TypedKind::Ident(name.clone()),
        )),

        Expr::Lam {
            params,
            body,
            is_async,
        } => annotate_lambda(ctx, params, body, *is_async, constraints),

        Expr::App { func, args } => {
            let func = annotate_into(ctx, func, constraints)?;
            let mut arg_types = Vec::with_capacity(args.len());
            let mut typed_args = Vec::with_capacity(args.len());
            let mut variadic = false;

            for (i, arg) in args.iter().enumerate() {
                let Expr::Rest(inner) = arg else {
                    let typed = annotate_into(ctx, arg, constraints)?;
                    arg_types.push(typed.ty.clone());
                    typed_args.push(typed);
                    continue;
                };
                let typed = annotate_into(ctx, inner, constraints)?;
                match peek(ctx, constraints, &typed.ty)?.kind {
                    TypeKind::Tuple(elems) => arg_types.extend(elems),
                    _ if i + 1 == args.len() => {
                        arg_types.push(typed.ty.clone());
                        variadic = true;
                    }
                    _ => return Err(InferError::MisplacedRest),
                }
                typed_args.push(TypedExpr::new(typed.ty.clone(), TypedKind::Rest(Box::new(typed))));
            }

            let ret = ctx.fresh();
            let call_site = ctx.positional_fun(arg_types, ret.clone(), variadic);
            constraints.push(Constraint::subtype(func.ty.clone(), call_site));

            Ok(TypedExpr::new(
                ret,
                TypedKind::App {
                    func: Box::new(func),
                    args: typed_args,
                },
            ))
        }

        Expr::Let {
            name,
            rec,
            value,
            body,
        } => {
            let recursive;
            let value = if *rec {
                recursive = Expr::Fix(Box::new(Expr::Lam {
                    params: vec![Param::new(name.clone())],
                    body: value.clone(),
                    is_async: false,
                }));
                &recursive
            } else {
                value.as_ref()
            };

            let mut local = Vec::new();
            let value = annotate_into(ctx, value, &mut local)?;
            let subst = solve(ctx, &local)?;
            let env = ctx.env.apply_subst(&subst);
            let scheme = ctx.generalize(&env, &subst.apply(&value.ty));
            constraints.extend(local);

            let body_ctx = ctx.with_env(env.extend(name.clone(), scheme));
            let body = annotate_into(&body_ctx, body, constraints)?;

            Ok(TypedExpr::new(
                body.ty.clone(),
                TypedKind::Let {
                    name: name.clone(),
                    value: Box::new(value),
                    body: Box::new(body),
                },
            ))
        }

        Expr::Fix(inner) => {
            // type(inner) = (arg) => ret, then ret = arg.
            let inner = annotate_into(ctx, inner, constraints)?;
            let arg = ctx.fresh();
            let ret = ctx.fresh();
            let step = ctx.positional_fun(vec![arg.clone()], ret.clone(), false);
            constraints.push(Constraint::equal(step, inner.ty.clone()));
            constraints.push(Constraint::equal(ret.clone(), arg));
            Ok(TypedExpr::new(ret, TypedKind::Fix(Box::new(inner))))
        }

        Expr::If { cond, then, else_ } => {
            let cond = annotate_into(ctx, cond, constraints)?;
            let then = annotate_into(ctx, then, constraints)?;
            let else_ = annotate_into(ctx, else_, constraints)?;
            constraints.push(Constraint::subtype(cond.ty.clone(), ctx.boolean().freeze()));
            constraints.push(Constraint::equal(then.ty.clone(), else_.ty.clone()));
            Ok(TypedExpr::new(
                then.ty.clone(),
                TypedKind::If {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    else_: Box::new(else_),
                },
            ))
        }

        Expr::Await(inner) => {
            if !ctx.is_async {
                return Err(InferError::AwaitOutsideAsync);
            }
            let inner = annotate_into(ctx, inner, constraints)?;
            // Awaiting something that is not a promise is a no-op.
            let ty = match peek(ctx, constraints, &inner.ty)?.promise_arg() {
                Some(value) => value.clone(),
                None => inner.ty.clone(),
            };
            Ok(TypedExpr::new(ty, TypedKind::Await(Box::new(inner))))
        }

        Expr::Rec(props) => {
            let mut types = IndexMap::with_capacity(props.len());
            let mut typed = Vec::with_capacity(props.len());
            for (name, value) in props {
                let value = annotate_into(ctx, value, constraints)?;
                types.insert(name.clone(), value.ty.clone());
                typed.push((name.clone(), value));
            }
            Ok(TypedExpr::new(
                ctx.stamp(TypeKind::Rec(types)),
                TypedKind::Rec(typed),
            ))
        }

        Expr::Tuple(elems) => {
            let mut types = Vec::with_capacity(elems.len());
            let mut typed = Vec::with_capacity(elems.len());
            for elem in elems {
                let Expr::Rest(inner) = elem else {
                    let elem = annotate_into(ctx, elem, constraints)?;
                    types.push(elem.ty.clone());
                    typed.push(elem);
                    continue;
                };
                let inner = annotate_into(ctx, inner, constraints)?;
                match peek(ctx, constraints, &inner.ty)?.kind {
                    TypeKind::Tuple(spread) => types.extend(spread),
                    _ => return Err(InferError::MisplacedRest),
                }
                typed.push(TypedExpr::new(inner.ty.clone(), TypedKind::Rest(Box::new(inner))));
            }
            Ok(TypedExpr::new(ctx.tuple(types), TypedKind::Tuple(typed)))
        }

        Expr::Mem { object, property } => {
            let key = member_key(property)?;
            let object = annotate_into(ctx, object, constraints)?;
            let resolved = peek(ctx, constraints, &object.ty)?;
            let ty = match resolve_member(ctx, &resolved, &key)? {
                Some(ty) => ty,
                None => {
                    // Not known yet; the solver settles the placeholder
                    // once the object is bound.
                    let ty = ctx.fresh();
                    let placeholder = ctx.mem(object.ty.clone(), key.clone());
                    constraints.push(Constraint::equal(ty.clone(), placeholder));
                    ty
                }
            };
            Ok(TypedExpr::new(
                ty,
                TypedKind::Mem {
                    object: Box::new(object),
                    key,
                },
            ))
        }

        Expr::Rest(_) => Err(InferError::MisplacedRest),

        Expr::TaggedTemplate { tag, quasis, exprs } => {
            let exprs = exprs
                .iter()
                .map(|e| annotate_into(ctx, e, constraints))
                .collect::<Result<Vec<_>>>()?;
            let arg_types: Vec<Type> = exprs.iter().map(|e| e.ty.clone()).collect();

            let ty = match ctx.tag(tag) {
                Some(handler) => handler.infer(ctx, quasis, &arg_types)?,
                None => {
                    let tag_ty = ctx.lookup(tag)?;
                    let mut params = vec![ctx.array(ctx.string()).freeze()];
                    params.extend(arg_types);
                    let ret = ctx.fresh();
                    let call_site = ctx.positional_fun(params, ret.clone(), false);
                    constraints.push(Constraint::subtype(tag_ty, call_site));
                    ret
                }
            };

            Ok(TypedExpr::new(
                ty,
                TypedKind::TaggedTemplate {
                    tag: tag.clone(),
                    quasis: quasis.clone(),
                    exprs,
                },
            ))
        }
    }
}

fn annotate_lambda(
    ctx: &Context,
    params: &[Param],
    body: &Expr,
    is_async: bool,
    constraints: &mut Vec<Constraint>,
) -> Result<TypedExpr> {
    let mut named_vars = HashMap::new();
    let mut fn_params = Vec::with_capacity(params.len());
    let mut env = ctx.env.clone();
    let mut variadic = false;

    for (i, param) in params.iter().enumerate() {
        if param.rest && i + 1 != params.len() {
            return Err(InferError::MisplacedRest);
        }
        let ty = match &param.annotation {
            // Annotations are authoritative; call sites may not widen them.
            Some(ann) => ctx.type_from_ann(ann, &mut named_vars)?.freeze(),
            None if param.rest => ctx.array(ctx.fresh()),
            None => ctx.fresh(),
        };
        variadic |= param.rest;
        env = env.extend(param.name.clone(), Scheme::mono(ty.clone()));
        fn_params.push(FnParam {
            name: param.name.clone(),
            ty,
            optional: param.optional,
        });
    }

    let body_ctx = ctx.with_env(env).with_async(is_async);
    let body = annotate_into(&body_ctx, body, constraints)?;

    let mut ret = body.ty.clone();
    if is_async && peek(ctx, constraints, &ret)?.promise_arg().is_none() {
        ret = ctx.promise(ret);
    }

    let ty = ctx.stamp(TypeKind::Fun(TFun {
        params: fn_params,
        ret: Box::new(ret),
        variadic,
    }));
    Ok(TypedExpr::new(
        ty,
        TypedKind::Lam {
            params: params.iter().map(|p| p.name.clone()).collect(),
            body: Box::new(body),
            is_async,
        },
    ))
}

/// What `ty` looks like given the constraints gathered so far.
fn peek(ctx: &Context, constraints: &[Constraint], ty: &Type) -> Result<Type> {
    if ty.is_var() || matches!(ty.kind, TypeKind::Mem { .. }) {
        let subst = solve(ctx, constraints)?;
        Ok(subst.apply(ty))
    } else {
        Ok(ty.clone())
    }
}

fn member_key(property: &Expr) -> Result<MemberKey> {
    match property {
        Expr::Ident(name) => Ok(MemberKey::Name(name.clone())),
        Expr::Lit(Literal::Str(name)) => Ok(MemberKey::Name(name.clone())),
        Expr::Lit(Literal::Num(n)) if *n >= 0.0 && n.fract() == 0.0 => {
            Ok(MemberKey::Index(*n as usize))
        }
        other => Err(InferError::InvalidProperty {
            found: describe(other),
        }),
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Lit(Literal::Num(n)) => n.to_string(),
        Expr::Lit(Literal::Bool(b)) => b.to_string(),
        Expr::Lit(Literal::Null) => "null".to_string(),
        Expr::Lit(Literal::Undefined) => "undefined".to_string(),
        Expr::Lit(Literal::Str(s)) => format!("{:?}", s),
        Expr::Ident(name) => name.clone(),
        Expr::Lam { .. } => "a lambda".to_string(),
        Expr::App { .. } => "a call".to_string(),
        Expr::Let { .. } => "a let expression".to_string(),
        Expr::Fix(_) => "a fixed point".to_string(),
        Expr::If { .. } => "an if expression".to_string(),
        Expr::Await(_) => "an await expression".to_string(),
        Expr::Rec(_) => "a record".to_string(),
        Expr::Tuple(_) => "a tuple".to_string(),
        Expr::Mem { .. } => "a member access".to_string(),
        Expr::Rest(_) => "a spread".to_string(),
        Expr::TaggedTemplate { .. } => "a tagged template".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::infer::env::TypeEnv;

    fn ctx() -> Context {
        let ctx = Context::new(TypeEnv::empty());
        let x = ctx.number();
        ctx.extend("x", Scheme::mono(x))
    }

    fn annotate(ctx: &Context, expr: &Expr) -> Result<(TypedExpr, Vec<Constraint>)> {
        let mut constraints = Vec::new();
        let typed = annotate_into(ctx, expr, &mut constraints)?;
        Ok((typed, constraints))
    }

    #[test]
    fn test_literal_has_no_constraints() {
        let (typed, cs) = annotate(&ctx(), &num(5.0)).unwrap();
        assert_eq!(typed.ty.to_string(), "5");
        assert!(cs.is_empty());
    }

    #[test]
    fn test_application_emits_subtype_constraint() {
        let base = ctx();
        let f = base.positional_fun(vec![base.number()], base.string(), false);
        let ctx = base.extend("f", Scheme::mono(f));
        let (typed, cs) = annotate(&ctx, &app(ident("f"), vec![num(1.0)])).unwrap();
        assert_eq!(cs.len(), 1);
        assert!(cs[0].subtype);
        assert!(typed.ty.is_var());
        assert_eq!(cs[0].right.to_string(), "(arg0: 1) => a");
    }

    #[test]
    fn test_lambda_params_are_fresh() {
        let (typed, _) = annotate(&ctx(), &lam(&["a", "b"], ident("a"))).unwrap();
        assert_eq!(typed.ty.to_string(), "(a: a, b: b) => a");
    }

    #[test]
    fn test_rest_param_is_array_and_variadic() {
        let expr = lam_with(vec![Param::new("xs").rest()], ident("xs"));
        let (typed, _) = annotate(&ctx(), &expr).unwrap();
        assert!(typed.ty.as_fun().unwrap().variadic);
        assert_eq!(typed.ty.to_string(), "(...xs: Array<a>) => Array<a>");
    }

    #[test]
    fn test_rest_param_must_be_last() {
        let expr = lam_with(vec![Param::new("xs").rest(), Param::new("y")], num(1.0));
        assert!(matches!(
            annotate(&ctx(), &expr).unwrap_err(),
            InferError::MisplacedRest
        ));
    }

    #[test]
    fn test_annotated_param_is_frozen() {
        let expr = lam_with(
            vec![Param::annotated("n", TypeAnn::Prim("number".into()))],
            ident("n"),
        );
        let (typed, _) = annotate(&ctx(), &expr).unwrap();
        let fun = typed.ty.as_fun().unwrap();
        assert!(fun.params[0].ty.frozen);
        assert_eq!(typed.ty.to_string(), "(n: number) => number");
    }

    #[test]
    fn test_unbound_identifier() {
        let err = annotate(&ctx(), &ident("nope")).unwrap_err();
        assert!(matches!(err, InferError::UnboundVariable { .. }));
    }

    #[test]
    fn test_await_requires_async() {
        let err = annotate(&ctx(), &lam(&[], await_(num(1.0)))).unwrap_err();
        assert!(matches!(err, InferError::AwaitOutsideAsync));

        let nested = async_lam(&[], lam(&[], await_(num(1.0))));
        let err = annotate(&ctx(), &nested).unwrap_err();
        assert!(matches!(err, InferError::AwaitOutsideAsync));
    }

    #[test]
    fn test_await_non_promise_passes_through() {
        let (typed, _) = annotate(&ctx(), &async_lam(&[], await_(num(1.0)))).unwrap();
        assert_eq!(typed.ty.to_string(), "() => Promise<1>");
    }

    #[test]
    fn test_spread_outside_call_or_tuple() {
        let err = annotate(&ctx(), &rest(ident("x"))).unwrap_err();
        assert!(matches!(err, InferError::MisplacedRest));

        let err = annotate(&ctx(), &tuple(vec![rest(ident("x"))])).unwrap_err();
        assert!(matches!(err, InferError::MisplacedRest));
    }

    #[test]
    fn test_spread_tuple_in_tuple() {
        let expr = tuple(vec![num(1.0), rest(tuple(vec![num(2.0), num(3.0)]))]);
        let (typed, _) = annotate(&ctx(), &expr).unwrap();
        assert_eq!(typed.ty.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_invalid_property() {
        let err = annotate(&ctx(), &index(ident("x"), num(1.5))).unwrap_err();
        assert!(matches!(err, InferError::InvalidProperty { found } if found == "1.5"));

        let err = annotate(&ctx(), &index(ident("x"), bool_(true))).unwrap_err();
        assert!(matches!(err, InferError::InvalidProperty { .. }));
    }

    #[test]
    fn test_member_on_variable_is_deferred() {
        let (typed, cs) = annotate(&ctx(), &lam(&["o"], mem(ident("o"), "foo"))).unwrap();
        assert_eq!(cs.len(), 1);
        assert!(!cs[0].subtype);
        assert_eq!(cs[0].right.to_string(), "a.foo");
        assert!(typed.ty.as_fun().unwrap().ret.is_var());
    }

    #[test]
    fn test_member_on_record_resolves_now() {
        let expr = mem(rec(vec![("foo", num(1.0))]), "foo");
        let (typed, cs) = annotate(&ctx(), &expr).unwrap();
        assert!(cs.is_empty());
        assert_eq!(typed.ty.to_string(), "1");
    }

    #[test]
    fn test_typed_expr_apply_subst() {
        let (typed, cs) = annotate(&ctx(), &let_("y", ident("x"), ident("y"))).unwrap();
        let subst = solve(&ctx(), &cs).unwrap();
        let applied = typed.apply_subst(&subst);
        let mut types = Vec::new();
        applied.walk(&mut |e| types.push(e.ty.to_string()));
        assert_eq!(types, vec!["number", "number", "number"]);
    }
}
