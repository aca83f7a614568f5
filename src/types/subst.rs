//! Substitutions and the `Substitutable` trait.
//!
//! Substitutions are keyed by node id. Most keys are type variables, but
//! widening also rebinds the ids of literal and union nodes, so `apply`
//! checks every node it visits.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::ty::{Scheme, TVar, Type, TypeId, TypeKind};

/// A substitution mapping node ids to types.
#[derive(Clone, Debug, Default)]
pub struct Subst {
    map: HashMap<TypeId, Type>,
}

impl Subst {
    /// Create an empty substitution.
    pub fn empty() -> Self {
        Subst {
            map: HashMap::new(),
        }
    }

    /// Create a singleton substitution.
    pub fn singleton(id: TypeId, ty: Type) -> Self {
        let mut map = HashMap::new();
        map.insert(id, ty);
        Subst { map }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.map.get(&id)
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.map.contains_key(&id)
    }

    pub fn insert(&mut self, id: TypeId, ty: Type) {
        self.map.insert(id, ty);
    }

    /// Compose a newer substitution (`self`) with an older one.
    ///
    /// Every binding of `older` gets `self` applied so it stays current, then
    /// the bindings of `self` are merged in, winning on overlapping keys.
    pub fn compose(&self, older: &Subst) -> Subst {
        let mut map: HashMap<TypeId, Type> = older
            .map
            .iter()
            .map(|(id, ty)| (*id, self.apply(ty)))
            .collect();

        for (id, ty) in &self.map {
            map.insert(*id, ty.clone());
        }

        Subst { map }
    }

    /// Apply this substitution to a substitutable value.
    pub fn apply<T: Substitutable>(&self, t: &T) -> T {
        t.apply_subst(self)
    }

    /// Create a new substitution with the given ids removed.
    pub fn without(&self, ids: impl IntoIterator<Item = TypeId>) -> Subst {
        let mut map = self.map.clone();
        for id in ids {
            map.remove(&id);
        }
        Subst { map }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeId, &Type)> {
        self.map.iter()
    }
}

impl FromIterator<(TypeId, Type)> for Subst {
    fn from_iter<T: IntoIterator<Item = (TypeId, Type)>>(iter: T) -> Self {
        Subst {
            map: iter.into_iter().collect(),
        }
    }
}

/// Trait for values that can have substitutions applied.
pub trait Substitutable {
    /// Apply a substitution to this value.
    fn apply_subst(&self, subst: &Subst) -> Self;

    /// Collect the free type variables, in order of first occurrence.
    fn free_vars(&self) -> IndexSet<TVar>;
}

impl Substitutable for Type {
    fn apply_subst(&self, subst: &Subst) -> Self {
        if subst.is_empty() {
            return self.clone();
        }

        // Replaced wholesale; chase in case the replacement is itself bound.
        if let Some(ty) = subst.get(self.id) {
            return ty.apply_subst(subst);
        }

        Type {
            id: self.id,
            frozen: self.frozen,
            kind: self.kind.map_children(|child| child.apply_subst(subst)),
        }
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        let mut vars = IndexSet::new();
        collect_free_vars(self, &mut vars);
        vars
    }
}

fn collect_free_vars(ty: &Type, vars: &mut IndexSet<TVar>) {
    match &ty.kind {
        TypeKind::Var(name) => {
            vars.insert(TVar {
                id: ty.id,
                name: name.clone(),
            });
        }
        TypeKind::Prim(_)
        | TypeKind::Lit(_)
        | TypeKind::Fun(_)
        | TypeKind::Gen(_)
        | TypeKind::Rec(_)
        | TypeKind::Tuple(_)
        | TypeKind::Union(_)
        | TypeKind::Mem { .. } => ty.kind.for_each_child(|child| collect_free_vars(child, vars)),
    }
}

impl Substitutable for Scheme {
    fn apply_subst(&self, subst: &Subst) -> Self {
        // Qualifiers are bound by the scheme, never substituted from outside.
        let filtered = subst.without(self.qualifiers.iter().map(|q| q.id));
        Scheme {
            qualifiers: self.qualifiers.clone(),
            ty: self.ty.apply_subst(&filtered),
        }
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        let mut vars = self.ty.free_vars();
        vars.retain(|v| !self.qualifiers.contains(v));
        vars
    }
}

impl<T: Substitutable> Substitutable for Vec<T> {
    fn apply_subst(&self, subst: &Subst) -> Self {
        self.iter().map(|t| t.apply_subst(subst)).collect()
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        let mut vars = IndexSet::new();
        for t in self {
            vars.extend(t.free_vars());
        }
        vars
    }
}

impl<T: Substitutable> Substitutable for Option<T> {
    fn apply_subst(&self, subst: &Subst) -> Self {
        self.as_ref().map(|t| t.apply_subst(subst))
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        self.as_ref().map(|t| t.free_vars()).unwrap_or_default()
    }
}
