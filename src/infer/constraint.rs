//! Constraints emitted by the annotator and consumed by the solver.

use std::fmt;

use indexmap::IndexSet;

use crate::types::{PrettyContext, Subst, Substitutable, TVar, Type};

/// A requirement between two types.
///
/// With `subtype` unset both sides must unify exactly. With `subtype` set,
/// `left` must be usable where `right` is expected.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub left: Type,
    pub right: Type,
    pub subtype: bool,
}

impl Constraint {
    pub fn equal(left: Type, right: Type) -> Self {
        Constraint {
            left,
            right,
            subtype: false,
        }
    }

    pub fn subtype(left: Type, right: Type) -> Self {
        Constraint {
            left,
            right,
            subtype: true,
        }
    }
}

impl Substitutable for Constraint {
    fn apply_subst(&self, subst: &Subst) -> Self {
        Constraint {
            left: self.left.apply_subst(subst),
            right: self.right.apply_subst(subst),
            subtype: self.subtype,
        }
    }

    fn free_vars(&self) -> IndexSet<TVar> {
        let mut vars = self.left.free_vars();
        vars.extend(self.right.free_vars());
        vars
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        let left = ctx.format_type(&self.left);
        let right = ctx.format_type(&self.right);
        let op = if self.subtype { "<:" } else { "=" };
        write!(f, "{} {} {}", left, op, right)
    }
}
