//! Core type definitions for infern type inference.
//!
//! Every type node carries a globally unique id and a `frozen` flag. The id is
//! the node's identity: substitutions are keyed by it, so a type variable is
//! resolved by looking its id up, and a widened literal is replaced by looking
//! up the literal node's id. Two structurally identical nodes with different
//! ids are different nodes.

use std::convert::Infallible;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

/// Unique identifier of a type node.
pub type TypeId = u32;

/// Nominal primitive types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    Number,
    String,
    Boolean,
    Null,
    Undefined,
}

impl Prim {
    /// The name the primitive is printed with and looked up by (for its
    /// method table in the environment).
    pub fn name(&self) -> &'static str {
        match self {
            Prim::Number => "number",
            Prim::String => "string",
            Prim::Boolean => "boolean",
            Prim::Null => "null",
            Prim::Undefined => "undefined",
        }
    }
}

/// The value of a literal type.
#[derive(Clone, Debug, PartialEq)]
pub enum Lit {
    Num(f64),
    Str(String),
    Bool(bool),
}

impl Lit {
    /// The primitive every literal of this kind is a subtype of.
    pub fn prim(&self) -> Prim {
        match self {
            Lit::Num(_) => Prim::Number,
            Lit::Str(_) => Prim::String,
            Lit::Bool(_) => Prim::Boolean,
        }
    }
}

/// A type variable, identified by its id alone.
#[derive(Clone, Debug)]
pub struct TVar {
    pub id: TypeId,
    /// Display name; set for builtin parameters and normalized qualifiers.
    pub name: Option<String>,
}

impl TVar {
    pub fn to_type(&self) -> Type {
        Type::new(self.id, TypeKind::Var(self.name.clone()))
    }
}

impl PartialEq for TVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TVar {}

impl Hash for TVar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A function parameter.
#[derive(Clone, Debug)]
pub struct FnParam {
    pub name: String,
    pub ty: Type,
    /// Optional parameters may be left out at call sites.
    pub optional: bool,
}

impl FnParam {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        FnParam {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: Type) -> Self {
        FnParam {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// Function type. When `variadic` is set the last parameter collects all
/// remaining arguments.
#[derive(Clone, Debug)]
pub struct TFun {
    pub params: Vec<FnParam>,
    pub ret: Box<Type>,
    pub variadic: bool,
}

/// Generic (parameterized) nominal type such as `Array<T>` or `Promise<T>`.
#[derive(Clone, Debug)]
pub struct TGen {
    pub name: String,
    pub args: Vec<Type>,
}

/// The property selected by a member access.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKey {
    Name(String),
    Index(usize),
}

impl MemberKey {
    /// The record key this member refers to.
    pub fn as_record_key(&self) -> String {
        match self {
            MemberKey::Name(name) => name.clone(),
            MemberKey::Index(index) => index.to_string(),
        }
    }
}

/// The shape of a type node.
#[derive(Clone, Debug)]
pub enum TypeKind {
    /// Unification variable, resolved through the substitution.
    Var(Option<String>),
    Prim(Prim),
    Lit(Lit),
    Fun(TFun),
    Gen(TGen),
    /// Structural record. Keys are unique; their order only affects printing.
    Rec(IndexMap<String, Type>),
    Tuple(Vec<Type>),
    /// Alternatives. May hold duplicates until normalized.
    Union(Vec<Type>),
    /// Deferred "type of `key` on `object`", pending until the object resolves.
    Mem { object: Box<Type>, key: MemberKey },
}

impl TypeKind {
    /// Rebuild this node with `f` applied to every direct child.
    pub fn try_map_children<E>(
        &self,
        mut f: impl FnMut(&Type) -> Result<Type, E>,
    ) -> Result<TypeKind, E> {
        Ok(match self {
            TypeKind::Var(name) => TypeKind::Var(name.clone()),
            TypeKind::Prim(prim) => TypeKind::Prim(*prim),
            TypeKind::Lit(lit) => TypeKind::Lit(lit.clone()),
            TypeKind::Fun(fun) => {
                let mut params = Vec::with_capacity(fun.params.len());
                for param in &fun.params {
                    params.push(FnParam {
                        name: param.name.clone(),
                        ty: f(&param.ty)?,
                        optional: param.optional,
                    });
                }
                TypeKind::Fun(TFun {
                    params,
                    ret: Box::new(f(&fun.ret)?),
                    variadic: fun.variadic,
                })
            }
            TypeKind::Gen(generic) => TypeKind::Gen(TGen {
                name: generic.name.clone(),
                args: generic.args.iter().map(&mut f).collect::<Result<_, E>>()?,
            }),
            TypeKind::Rec(props) => {
                let mut mapped = IndexMap::with_capacity(props.len());
                for (name, ty) in props {
                    mapped.insert(name.clone(), f(ty)?);
                }
                TypeKind::Rec(mapped)
            }
            TypeKind::Tuple(types) => {
                TypeKind::Tuple(types.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            TypeKind::Union(types) => {
                TypeKind::Union(types.iter().map(&mut f).collect::<Result<_, E>>()?)
            }
            TypeKind::Mem { object, key } => TypeKind::Mem {
                object: Box::new(f(object)?),
                key: key.clone(),
            },
        })
    }

    /// Infallible variant of [`TypeKind::try_map_children`].
    pub fn map_children(&self, mut f: impl FnMut(&Type) -> Type) -> TypeKind {
        match self.try_map_children(|child| Ok::<_, Infallible>(f(child))) {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }

    /// Visit every direct child.
    pub fn for_each_child(&self, mut f: impl FnMut(&Type)) {
        match self {
            TypeKind::Var(_) | TypeKind::Prim(_) | TypeKind::Lit(_) => {}
            TypeKind::Fun(fun) => {
                for param in &fun.params {
                    f(&param.ty);
                }
                f(&fun.ret);
            }
            TypeKind::Gen(generic) => generic.args.iter().for_each(f),
            TypeKind::Rec(props) => props.values().for_each(f),
            TypeKind::Tuple(types) | TypeKind::Union(types) => types.iter().for_each(f),
            TypeKind::Mem { object, .. } => f(object),
        }
    }
}

/// A type node.
#[derive(Clone, Debug)]
pub struct Type {
    pub id: TypeId,
    /// Frozen types are never widened by unification.
    pub frozen: bool,
    pub kind: TypeKind,
}

impl Type {
    /// Wrap a kind with an id. Ids come from [`crate::infer::Context`].
    pub fn new(id: TypeId, kind: TypeKind) -> Self {
        Type {
            id,
            frozen: false,
            kind,
        }
    }

    // === Predicates and accessors ===

    pub fn is_var(&self) -> bool {
        matches!(self.kind, TypeKind::Var(_))
    }

    pub fn as_var(&self) -> Option<TVar> {
        match &self.kind {
            TypeKind::Var(name) => Some(TVar {
                id: self.id,
                name: name.clone(),
            }),
            _ => None,
        }
    }

    pub fn as_fun(&self) -> Option<&TFun> {
        match &self.kind {
            TypeKind::Fun(fun) => Some(fun),
            _ => None,
        }
    }

    /// The single type argument of `name<T>`, if this is one.
    pub fn generic_arg(&self, name: &str) -> Option<&Type> {
        match &self.kind {
            TypeKind::Gen(generic) if generic.name == name && generic.args.len() == 1 => {
                Some(&generic.args[0])
            }
            _ => None,
        }
    }

    /// The `T` of `Promise<T>`.
    pub fn promise_arg(&self) -> Option<&Type> {
        self.generic_arg("Promise")
    }

    /// Check whether any node of this type has the given id.
    pub fn contains_id(&self, id: TypeId) -> bool {
        if self.id == id {
            return true;
        }
        let mut found = false;
        self.kind.for_each_child(|child| found = found || child.contains_id(id));
        found
    }

    /// Return a copy with this node and every descendant frozen.
    pub fn freeze(&self) -> Type {
        Type {
            id: self.id,
            frozen: true,
            kind: self.kind.map_children(Type::freeze),
        }
    }

    /// Structural equality ignoring node ids and frozen flags. Variables are
    /// still compared by id; union members are compared as multisets.
    pub fn equiv(&self, other: &Type) -> bool {
        match (&self.kind, &other.kind) {
            (TypeKind::Var(_), TypeKind::Var(_)) => self.id == other.id,
            (TypeKind::Prim(a), TypeKind::Prim(b)) => a == b,
            (TypeKind::Lit(a), TypeKind::Lit(b)) => a == b,
            (TypeKind::Fun(a), TypeKind::Fun(b)) => {
                a.variadic == b.variadic
                    && a.params.len() == b.params.len()
                    && a.params
                        .iter()
                        .zip(&b.params)
                        .all(|(p, q)| p.optional == q.optional && p.ty.equiv(&q.ty))
                    && a.ret.equiv(&b.ret)
            }
            (TypeKind::Gen(a), TypeKind::Gen(b)) => {
                a.name == b.name && all_equiv(&a.args, &b.args)
            }
            (TypeKind::Rec(a), TypeKind::Rec(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, t)| b.get(k).is_some_and(|other| t.equiv(other)))
            }
            (TypeKind::Tuple(a), TypeKind::Tuple(b)) => all_equiv(a, b),
            (TypeKind::Union(a), TypeKind::Union(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut used = vec![false; b.len()];
                a.iter().all(|member| {
                    let hit = b
                        .iter()
                        .enumerate()
                        .position(|(i, other)| !used[i] && member.equiv(other));
                    match hit {
                        Some(i) => {
                            used[i] = true;
                            true
                        }
                        None => false,
                    }
                })
            }
            (
                TypeKind::Mem {
                    object: o1,
                    key: k1,
                },
                TypeKind::Mem {
                    object: o2,
                    key: k2,
                },
            ) => k1 == k2 && o1.equiv(o2),
            _ => false,
        }
    }
}

fn all_equiv(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equiv(y))
}

/// Type scheme: a type quantified over `qualifiers`.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub qualifiers: Vec<TVar>,
    pub ty: Type,
}

impl Scheme {
    pub fn new(qualifiers: Vec<TVar>, ty: Type) -> Self {
        Scheme { qualifiers, ty }
    }

    /// A scheme with no quantified variables.
    pub fn mono(ty: Type) -> Self {
        Scheme {
            qualifiers: vec![],
            ty,
        }
    }

    pub fn is_mono(&self) -> bool {
        self.qualifiers.is_empty()
    }

    pub fn freeze(&self) -> Scheme {
        Scheme {
            qualifiers: self.qualifiers.clone(),
            ty: self.ty.freeze(),
        }
    }
}
