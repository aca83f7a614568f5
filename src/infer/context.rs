//! Inference context.
//!
//! A `Context` bundles everything the annotator and solver consult: the
//! current environment, the shared id counter, whether we are inside an
//! async lambda, and the registered tagged-template handlers.
//!
//! Every type node is built through a context so that it gets a fresh id.
//! Two structurally identical types built separately are distinct nodes;
//! only a substitution can make them the same.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Literal, TypeAnn};
use crate::error::{InferError, Result};
use crate::types::{
    FnParam, Lit, MemberKey, Prim, Scheme, Substitutable, TFun, TGen, TVar, Type, TypeId,
    TypeKind,
};

use super::env::TypeEnv;

/// Id allocation state shared by every context of one engine.
#[derive(Debug, Default)]
pub struct State {
    next_id: Cell<TypeId>,
}

impl State {
    pub fn new() -> Self {
        State {
            next_id: Cell::new(0),
        }
    }

    fn next_id(&self) -> TypeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// Infers the type of a tagged template for one specific tag.
///
/// `args` are the types of the interpolated expressions, in order. The
/// returned type is used as-is, without going through unification.
pub trait TagHandler {
    fn infer(&self, ctx: &Context, quasis: &[String], args: &[Type]) -> Result<Type>;
}

pub(crate) type TagRegistry = HashMap<String, Rc<dyn TagHandler>>;

/// Context for annotating one expression.
#[derive(Clone)]
pub struct Context {
    pub env: TypeEnv,
    state: Rc<State>,
    /// Set inside the body of an async lambda.
    pub is_async: bool,
    tags: Rc<TagRegistry>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("env", &self.env)
            .field("state", &self.state)
            .field("is_async", &self.is_async)
            .field("tags", &self.tags.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Context {
    /// A context with its own, fresh id counter.
    pub fn new(env: TypeEnv) -> Self {
        Context::with_state(env, Rc::new(State::new()))
    }

    pub fn with_state(env: TypeEnv, state: Rc<State>) -> Self {
        Context {
            env,
            state,
            is_async: false,
            tags: Rc::new(HashMap::new()),
        }
    }

    pub(crate) fn with_tags(mut self, tags: Rc<TagRegistry>) -> Self {
        self.tags = tags;
        self
    }

    // === Scoping ===

    /// The same context with a different environment.
    pub fn with_env(&self, env: TypeEnv) -> Context {
        Context {
            env,
            ..self.clone()
        }
    }

    /// The same context with one more binding in scope.
    pub fn extend(&self, name: impl Into<String>, scheme: Scheme) -> Context {
        self.with_env(self.env.extend(name, scheme))
    }

    pub fn with_async(&self, is_async: bool) -> Context {
        Context {
            is_async,
            ..self.clone()
        }
    }

    pub fn tag(&self, name: &str) -> Option<Rc<dyn TagHandler>> {
        self.tags.get(name).cloned()
    }

    // === Id allocation and builders ===

    pub fn next_id(&self) -> TypeId {
        self.state.next_id()
    }

    /// Wrap a kind in a node with a fresh id.
    pub fn stamp(&self, kind: TypeKind) -> Type {
        Type::new(self.next_id(), kind)
    }

    /// A fresh, unbound type variable.
    pub fn fresh(&self) -> Type {
        self.stamp(TypeKind::Var(None))
    }

    pub fn fresh_tvar(&self) -> TVar {
        TVar {
            id: self.next_id(),
            name: None,
        }
    }

    /// A fresh type variable with a display name.
    pub fn named_tvar(&self, name: impl Into<String>) -> TVar {
        TVar {
            id: self.next_id(),
            name: Some(name.into()),
        }
    }

    pub fn prim(&self, prim: Prim) -> Type {
        self.stamp(TypeKind::Prim(prim))
    }

    pub fn number(&self) -> Type {
        self.prim(Prim::Number)
    }

    pub fn string(&self) -> Type {
        self.prim(Prim::String)
    }

    pub fn boolean(&self) -> Type {
        self.prim(Prim::Boolean)
    }

    pub fn null(&self) -> Type {
        self.prim(Prim::Null)
    }

    pub fn undefined(&self) -> Type {
        self.prim(Prim::Undefined)
    }

    pub fn lit(&self, lit: Lit) -> Type {
        self.stamp(TypeKind::Lit(lit))
    }

    /// The type of a literal expression.
    pub fn literal(&self, literal: &Literal) -> Type {
        match literal {
            Literal::Num(value) => self.lit(Lit::Num(*value)),
            Literal::Bool(value) => self.lit(Lit::Bool(*value)),
            Literal::Str(value) => self.lit(Lit::Str(value.clone())),
            Literal::Null => self.null(),
            Literal::Undefined => self.undefined(),
        }
    }

    pub fn fun(&self, params: Vec<FnParam>, ret: Type) -> Type {
        self.stamp(TypeKind::Fun(TFun {
            params,
            ret: Box::new(ret),
            variadic: false,
        }))
    }

    pub fn variadic_fun(&self, params: Vec<FnParam>, ret: Type) -> Type {
        self.stamp(TypeKind::Fun(TFun {
            params,
            ret: Box::new(ret),
            variadic: true,
        }))
    }

    /// A function whose parameters are named `arg0`, `arg1`, ...
    pub fn positional_fun(&self, params: Vec<Type>, ret: Type, variadic: bool) -> Type {
        let params = params
            .into_iter()
            .enumerate()
            .map(|(i, ty)| FnParam::new(format!("arg{}", i), ty))
            .collect();
        self.stamp(TypeKind::Fun(TFun {
            params,
            ret: Box::new(ret),
            variadic,
        }))
    }

    pub fn generic(&self, name: impl Into<String>, args: Vec<Type>) -> Type {
        self.stamp(TypeKind::Gen(TGen {
            name: name.into(),
            args,
        }))
    }

    pub fn array(&self, elem: Type) -> Type {
        self.generic("Array", vec![elem])
    }

    pub fn promise(&self, inner: Type) -> Type {
        self.generic("Promise", vec![inner])
    }

    pub fn rec<K: Into<String>>(&self, props: impl IntoIterator<Item = (K, Type)>) -> Type {
        let props: IndexMap<String, Type> = props.into_iter().map(|(k, t)| (k.into(), t)).collect();
        self.stamp(TypeKind::Rec(props))
    }

    pub fn tuple(&self, types: Vec<Type>) -> Type {
        self.stamp(TypeKind::Tuple(types))
    }

    /// A raw union node. Use [`super::widen::union_of`] for a normalized one.
    pub fn union(&self, types: Vec<Type>) -> Type {
        self.stamp(TypeKind::Union(types))
    }

    pub fn mem(&self, object: Type, key: MemberKey) -> Type {
        self.stamp(TypeKind::Mem {
            object: Box::new(object),
            key,
        })
    }

    // === Instantiation and generalization ===

    /// Copy a type, replacing the variables in `mapping` and giving every
    /// other non-variable node a fresh id. Frozen flags are kept.
    pub fn copy_with(&self, ty: &Type, mapping: &HashMap<TypeId, Type>) -> Type {
        if let TypeKind::Var(_) = ty.kind {
            return mapping.get(&ty.id).cloned().unwrap_or_else(|| ty.clone());
        }
        Type {
            id: self.next_id(),
            frozen: ty.frozen,
            kind: ty.kind.map_children(|child| self.copy_with(child, mapping)),
        }
    }

    /// Replace each qualifier of a scheme with a fresh variable.
    pub fn instantiate(&self, scheme: &Scheme) -> Type {
        if scheme.is_mono() {
            return scheme.ty.clone();
        }
        let mapping: HashMap<TypeId, Type> = scheme
            .qualifiers
            .iter()
            .map(|q| (q.id, self.fresh()))
            .collect();
        self.copy_with(&scheme.ty, &mapping)
    }

    /// Quantify over the variables of `ty` that are not free in `env`.
    pub fn generalize(&self, env: &TypeEnv, ty: &Type) -> Scheme {
        let env_vars = env.free_vars();
        let qualifiers = ty
            .free_vars()
            .into_iter()
            .filter(|v| !env_vars.contains(v))
            .collect();
        Scheme::new(qualifiers, ty.clone())
    }

    /// Instantiate the scheme bound to `name`.
    pub fn lookup(&self, name: &str) -> Result<Type> {
        self.env
            .lookup(name)
            .map(|scheme| self.instantiate(scheme))
            .ok_or_else(|| InferError::UnboundVariable {
                name: name.to_string(),
            })
    }

    /// Convert a parameter annotation. Named type variables are shared
    /// through `vars`.
    pub fn type_from_ann(&self, ann: &TypeAnn, vars: &mut HashMap<String, Type>) -> Result<Type> {
        Ok(match ann {
            TypeAnn::Prim(name) => match name.as_str() {
                "number" => self.number(),
                "string" => self.string(),
                "boolean" => self.boolean(),
                "null" => self.null(),
                "undefined" => self.undefined(),
                _ => self.type_from_ann(
                    &TypeAnn::Ref {
                        name: name.clone(),
                        args: vec![],
                    },
                    vars,
                )?,
            },
            TypeAnn::Lit(literal) => self.literal(literal),
            TypeAnn::Ref { name, args } => {
                if !self.env.contains(name) {
                    return Err(InferError::UnknownType { name: name.clone() });
                }
                let args = args
                    .iter()
                    .map(|arg| self.type_from_ann(arg, vars))
                    .collect::<Result<_>>()?;
                self.generic(name.clone(), args)
            }
            TypeAnn::Fun { params, ret } => {
                let mut converted = Vec::with_capacity(params.len());
                for (name, param) in params {
                    converted.push(FnParam::new(name.clone(), self.type_from_ann(param, vars)?));
                }
                let ret = self.type_from_ann(ret, vars)?;
                self.fun(converted, ret)
            }
            TypeAnn::Rec(props) => {
                let mut converted = IndexMap::with_capacity(props.len());
                for (name, prop) in props {
                    converted.insert(name.clone(), self.type_from_ann(prop, vars)?);
                }
                self.stamp(TypeKind::Rec(converted))
            }
            TypeAnn::Tuple(types) => {
                let types = types
                    .iter()
                    .map(|t| self.type_from_ann(t, vars))
                    .collect::<Result<_>>()?;
                self.tuple(types)
            }
            TypeAnn::Union(types) => {
                let types: Vec<Type> = types
                    .iter()
                    .map(|t| self.type_from_ann(t, vars))
                    .collect::<Result<_>>()?;
                super::widen::union_of(self, types)
            }
            TypeAnn::Var(name) => vars
                .entry(name.clone())
                .or_insert_with(|| self.fresh())
                .clone(),
        })
    }
}
