//! Property-based tests for union normalization and let-polymorphism.

use proptest::prelude::*;

use super::context::Context;
use super::engine::Engine;
use super::env::TypeEnv;
use super::widen::{compute_union, union_of};
use crate::ast::{self, Expr, Literal};
use crate::types::{Lit, Prim, Type};

#[derive(Clone, Debug)]
enum Atom {
    Lit(Lit),
    Prim(Prim),
}

// Small ranges so duplicates and literal/primitive overlaps are common
fn lit_strategy() -> impl Strategy<Value = Lit> {
    prop_oneof![
        (0i32..4).prop_map(|n| Lit::Num(n as f64)),
        prop::bool::ANY.prop_map(Lit::Bool),
        prop::string::string_regex("[a-c]").unwrap().prop_map(Lit::Str),
    ]
}

fn atom_strategy() -> impl Strategy<Value = Atom> {
    prop_oneof![
        3 => lit_strategy().prop_map(Atom::Lit),
        1 => prop_oneof![
            Just(Prim::Number),
            Just(Prim::String),
            Just(Prim::Boolean),
            Just(Prim::Null),
        ]
        .prop_map(Atom::Prim),
    ]
}

fn atoms_strategy() -> impl Strategy<Value = Vec<Atom>> {
    prop::collection::vec(atom_strategy(), 1..4)
}

fn build(ctx: &Context, atom: &Atom) -> Type {
    match atom {
        Atom::Lit(lit) => ctx.lit(lit.clone()),
        Atom::Prim(prim) => ctx.prim(*prim),
    }
}

fn build_union(ctx: &Context, atoms: &[Atom]) -> Type {
    union_of(ctx, atoms.iter().map(|a| build(ctx, a)).collect())
}

fn literal_expr(lit: &Lit) -> Expr {
    match lit {
        Lit::Num(n) => ast::num(*n),
        Lit::Bool(b) => ast::bool_(*b),
        Lit::Str(s) => Expr::Lit(Literal::Str(s.clone())),
    }
}

proptest! {
    #[test]
    fn union_is_idempotent(atoms in atoms_strategy()) {
        let ctx = Context::new(TypeEnv::empty());
        let u = build_union(&ctx, &atoms);
        let twice = compute_union(&ctx, &u, &u);
        prop_assert!(twice.equiv(&u), "{} vs {}", twice, u);
    }

    #[test]
    fn union_is_commutative(a in atoms_strategy(), b in atoms_strategy()) {
        let ctx = Context::new(TypeEnv::empty());
        let (ua, ub) = (build_union(&ctx, &a), build_union(&ctx, &b));
        let ab = compute_union(&ctx, &ua, &ub);
        let ba = compute_union(&ctx, &ub, &ua);
        prop_assert!(ab.equiv(&ba), "{} vs {}", ab, ba);
    }

    #[test]
    fn union_is_associative(
        a in atoms_strategy(),
        b in atoms_strategy(),
        c in atoms_strategy(),
    ) {
        let ctx = Context::new(TypeEnv::empty());
        let (ua, ub, uc) = (
            build_union(&ctx, &a),
            build_union(&ctx, &b),
            build_union(&ctx, &c),
        );
        let left = compute_union(&ctx, &compute_union(&ctx, &ua, &ub), &uc);
        let right = compute_union(&ctx, &ua, &compute_union(&ctx, &ub, &uc));
        prop_assert!(left.equiv(&right), "{} vs {}", left, right);
    }

    #[test]
    fn union_has_no_redundant_literals(atoms in atoms_strategy()) {
        let ctx = Context::new(TypeEnv::empty());
        let u = build_union(&ctx, &atoms);
        let members = match &u.kind {
            crate::types::TypeKind::Union(members) => members.clone(),
            _ => vec![u.clone()],
        };
        for member in &members {
            if let crate::types::TypeKind::Lit(lit) = &member.kind {
                let prim = lit.prim();
                prop_assert!(!members
                    .iter()
                    .any(|m| matches!(m.kind, crate::types::TypeKind::Prim(p) if p == prim)));
            }
        }
    }

    #[test]
    fn identity_specializes_independently(a in lit_strategy(), b in lit_strategy()) {
        let expr = ast::let_(
            "id",
            ast::lam(&["x"], ast::ident("x")),
            ast::tuple(vec![
                ast::app(ast::ident("id"), vec![literal_expr(&a)]),
                ast::app(ast::ident("id"), vec![literal_expr(&b)]),
            ]),
        );
        let scheme = Engine::new().infer_expr(&expr).unwrap();
        let ctx = Context::new(TypeEnv::empty());
        let expected = ctx.tuple(vec![ctx.lit(a), ctx.lit(b)]);
        prop_assert!(scheme.is_mono());
        prop_assert!(scheme.ty.equiv(&expected), "{}", scheme);
    }
}
