//! Infern: constraint-based type inference for a small JavaScript-like
//! expression language.
//!
//! Inference is Hindley-Milner at its core, extended with:
//!
//! - **Literal types** that widen into unions instead of failing to unify
//! - **Frozen types** from annotations and closed bindings, which never widen
//! - **Structural records and tuples**, with member access deferred until the
//!   object's shape is known
//! - **Partial application**, optional and rest parameters, spreads
//! - **Async lambdas** returning `Promise<T>` and `await`
//! - **Tagged templates**, optionally typed by registered handlers

pub mod ast;
pub mod builtins;
pub mod error;
pub mod infer;
pub mod types;

pub use error::{InferError, Result};
pub use infer::Engine;
