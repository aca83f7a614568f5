//! Type system module for infern.
//!
//! This module provides the core type definitions, substitution implementation,
//! and pretty-printing for the constraint-based inference engine.

mod pretty;
mod subst;
mod ty;

pub(crate) use pretty::var_name;
pub use pretty::PrettyContext;
pub use subst::{Subst, Substitutable};
pub use ty::{FnParam, Lit, MemberKey, Prim, Scheme, TFun, TGen, TVar, Type, TypeId, TypeKind};
