//! Name to scheme bindings. Scopes are introduced by extending a copy.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::types::{Scheme, Subst, Substitutable, TVar};

#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    bindings: HashMap<String, Scheme>,
}

impl TypeEnv {
    pub fn empty() -> Self {
        TypeEnv {
            bindings: HashMap::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.bindings.get(name)
    }

    /// A copy of this environment with `name` bound to `scheme`, shadowing
    /// any previous binding.
    pub fn extend(&self, name: impl Into<String>, scheme: Scheme) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.into(), scheme);
        TypeEnv { bindings }
    }

    /// Add a binding in place. Used when seeding an environment.
    pub fn insert(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.bindings.insert(name.into(), scheme);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scheme)> {
        self.bindings.iter()
    }
}

impl Substitutable for TypeEnv {
    fn apply_subst(&self, subst: &Subst) -> Self {
        let bindings = self
            .bindings
            .iter()
            .map(|(k, scheme)| (k.clone(), scheme.apply_subst(subst)))
            .collect();
        TypeEnv { bindings }
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        self.bindings.values().flat_map(|s| s.free_vars()).collect()
    }
}
