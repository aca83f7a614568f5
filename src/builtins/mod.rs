//! Built-in types and bindings.
//!
//! The initial environment holds two kinds of entries:
//! - Aliases for generic and primitive types (`Array`, `Promise`, `string`),
//!   whose schemes describe the members available on values of that type
//! - Operators modelled as ordinary frozen functions (`Add`, `Eql`, ...)

use crate::infer::{Context, TypeEnv};
use crate::types::{FnParam, Scheme, Type};

/// Create the initial type environment with built-in bindings.
pub fn initial_env(ctx: &Context) -> TypeEnv {
    let mut env = TypeEnv::empty();

    env.insert("Array", array_alias(ctx));
    env.insert("Promise", promise_alias(ctx));
    env.insert("string", string_alias(ctx));

    for name in ["Add", "Sub", "Mul", "Div"] {
        env.insert(name, binary_number_op(ctx, ctx.number()));
    }
    env.insert("Eql", binary_number_op(ctx, ctx.boolean()));

    env
}

/// `Array<T>`: `length` and `map`. The `U` of `map` is left free so that
/// every access gets its own.
fn array_alias(ctx: &Context) -> Scheme {
    let t = ctx.named_tvar("T");
    let u = ctx.named_tvar("U");

    let callback = ctx.fun(
        vec![
            FnParam::new("item", t.to_type()),
            FnParam::new("index", ctx.number()),
            FnParam::new("array", ctx.array(t.to_type())),
        ],
        u.to_type(),
    );
    let map = ctx.fun(
        vec![FnParam::new("callback", callback)],
        ctx.array(u.to_type()),
    );

    Scheme::new(vec![t], ctx.rec([("length", ctx.number()), ("map", map)])).freeze()
}

/// `Promise<T>`: `then`.
fn promise_alias(ctx: &Context) -> Scheme {
    let t = ctx.named_tvar("T");
    let u = ctx.named_tvar("U");

    let callback = ctx.fun(vec![FnParam::new("value", t.to_type())], u.to_type());
    let then = ctx.fun(
        vec![FnParam::new("callback", callback)],
        ctx.promise(u.to_type()),
    );

    Scheme::new(vec![t], ctx.rec([("then", then)])).freeze()
}

/// Members of string values.
fn string_alias(ctx: &Context) -> Scheme {
    let split = ctx.fun(
        vec![FnParam::new("separator", ctx.string())],
        ctx.array(ctx.string()),
    );
    Scheme::mono(ctx.rec([("length", ctx.number()), ("split", split)])).freeze()
}

fn binary_number_op(ctx: &Context, ret: Type) -> Scheme {
    Scheme::mono(ctx.fun(
        vec![
            FnParam::new("left", ctx.number()),
            FnParam::new("right", ctx.number()),
        ],
        ret,
    ))
    .freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> TypeEnv {
        initial_env(&Context::new(TypeEnv::empty()))
    }

    #[test]
    fn test_builtins_are_frozen() {
        let env = env();
        for (name, scheme) in env.iter() {
            assert!(scheme.ty.frozen, "{} should be frozen", name);
        }
    }

    #[test]
    fn test_array_alias_shape() {
        let env = env();
        let array = env.lookup("Array").unwrap();
        assert_eq!(array.qualifiers.len(), 1);
        assert_eq!(
            array.to_string(),
            concat!(
                "<T>{length: number, ",
                "map: (callback: (item: T, index: number, array: Array<T>) => U) => Array<U>}"
            )
        );
    }

    #[test]
    fn test_operators() {
        let env = env();
        assert_eq!(
            env.lookup("Add").unwrap().to_string(),
            "(left: number, right: number) => number"
        );
        assert_eq!(
            env.lookup("Eql").unwrap().to_string(),
            "(left: number, right: number) => boolean"
        );
    }

    #[test]
    fn test_alias_free_vars_stay_out_of_generalization() {
        let env = env();
        let names: Vec<String> = crate::types::Substitutable::free_vars(&env)
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert!(names.iter().all(|n| n == "U"));
    }
}
