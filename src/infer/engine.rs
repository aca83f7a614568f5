//! Inference driver.
//!
//! Annotates an expression, solves its constraints, and closes the result
//! into a normalized, frozen scheme. `Engine` keeps the environment and id
//! counter across top-level declarations.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::ast::{Decl, Expr, Param};
use crate::builtins::initial_env;
use crate::error::Result;
use crate::types::{var_name, Scheme, Subst, Substitutable, Type};

use super::annotate::{annotate_into, TypedExpr};
use super::context::{Context, State, TagHandler, TagRegistry};
use super::env::TypeEnv;
use super::unify::{settle_deep, solve};

/// Infer the principal scheme of an expression.
pub fn infer_expr(ctx: &Context, expr: &Expr) -> Result<Scheme> {
    infer_typed(ctx, expr).map(|(scheme, _)| scheme)
}

/// Infer the principal scheme of an expression, along with the expression
/// annotated with the solved type of every node.
pub fn infer_typed(ctx: &Context, expr: &Expr) -> Result<(Scheme, TypedExpr)> {
    let mut constraints = Vec::new();
    let typed = annotate_into(ctx, expr, &mut constraints)?;
    debug!("solving {} constraints", constraints.len());

    let subst = solve(ctx, &constraints)?;
    // Placeholders whose objects are now known resolve on every node.
    let typed = typed
        .apply_subst(&subst)
        .try_map_types(&mut |ty| settle_deep(ctx, ty))?;
    let env = ctx.env.apply_subst(&subst);

    Ok((close(ctx, &env, &typed.ty), typed))
}

/// Generalize, rename the qualifiers to `a, b, ...` and freeze.
fn close(ctx: &Context, env: &TypeEnv, ty: &Type) -> Scheme {
    let scheme = ctx.generalize(env, ty);

    let renamed: Vec<_> = (0..scheme.qualifiers.len())
        .map(|i| ctx.named_tvar(var_name(i)))
        .collect();
    let subst: Subst = scheme
        .qualifiers
        .iter()
        .zip(&renamed)
        .map(|(old, new)| (old.id, new.to_type()))
        .collect();

    Scheme::new(renamed, subst.apply(&scheme.ty)).freeze()
}

/// Stateful inference over a sequence of top-level declarations.
///
/// Every declaration is inferred against the bindings of the previous ones
/// and added to the environment as a frozen scheme. Ids are unique across
/// the whole engine.
pub struct Engine {
    state: Rc<State>,
    env: TypeEnv,
    tags: Rc<TagRegistry>,
}

impl Engine {
    /// An engine seeded with the builtin environment.
    pub fn new() -> Self {
        let state = Rc::new(State::new());
        let env = initial_env(&Context::with_state(TypeEnv::empty(), state.clone()));
        Engine {
            state,
            env,
            tags: Rc::new(HashMap::new()),
        }
    }

    /// An engine seeded with an explicit environment.
    pub fn with_env(env: TypeEnv) -> Self {
        Engine {
            state: Rc::new(State::new()),
            env,
            tags: Rc::new(HashMap::new()),
        }
    }

    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    /// A context over the current environment sharing this engine's ids.
    /// Use it to build types for [`Engine::define`].
    pub fn context(&self) -> Context {
        Context::with_state(self.env.clone(), self.state.clone()).with_tags(self.tags.clone())
    }

    /// Bind a name to a pre-built scheme.
    pub fn define(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.env.insert(name, scheme);
    }

    /// Handle tagged templates with the given tag through `handler`.
    pub fn register_tag(&mut self, tag: impl Into<String>, handler: impl TagHandler + 'static) {
        Rc::make_mut(&mut self.tags).insert(tag.into(), Rc::new(handler));
    }

    pub fn infer_expr(&self, expr: &Expr) -> Result<Scheme> {
        infer_expr(&self.context(), expr)
    }

    pub fn infer_typed(&self, expr: &Expr) -> Result<(Scheme, TypedExpr)> {
        infer_typed(&self.context(), expr)
    }

    /// Infer a declaration and bind it for the ones that follow.
    pub fn infer_decl(&mut self, decl: &Decl) -> Result<Scheme> {
        let scheme = if decl.rec {
            let recursive = Expr::Fix(Box::new(Expr::Lam {
                params: vec![Param::new(decl.name.clone())],
                body: Box::new(decl.value.clone()),
                is_async: false,
            }));
            self.infer_expr(&recursive)?
        } else {
            self.infer_expr(&decl.value)?
        };

        debug!("{} : {}", decl.name, scheme);
        self.env.insert(decl.name.clone(), scheme.clone());
        Ok(scheme)
    }

    /// Infer declarations in order, stopping at the first error.
    pub fn infer_program(&mut self, decls: &[Decl]) -> Result<Vec<Scheme>> {
        decls.iter().map(|decl| self.infer_decl(decl)).collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
