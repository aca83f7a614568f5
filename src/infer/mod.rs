//! Type inference.
//!
//! - `context`: shared id counter, type builders, instantiation and
//!   generalization
//! - `env`: type environment for variable bindings
//! - `annotate`: constraint generation over expressions
//! - `unify`: constraint solving with subtyping and widening
//! - `widen`: union normalization
//! - `member`: member access resolution
//! - `engine`: the inference driver and stateful `Engine`

mod annotate;
mod constraint;
mod context;
mod engine;
mod env;
mod member;
mod unify;
mod widen;

#[cfg(test)]
mod proptests;

pub use annotate::{annotate_into, TypedExpr, TypedKind};
pub use constraint::Constraint;
pub use context::{Context, State, TagHandler};
pub use engine::{infer_expr, infer_typed, Engine};
pub use env::TypeEnv;
pub use member::resolve_member;
pub use unify::{is_subtype, solve, solve_with, unify};
pub use widen::{compute_union, union_of};
