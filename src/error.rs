//! Error types for the infern type checker.

use thiserror::Error;

use crate::types::{MemberKey, Type};

/// Result type for infern operations.
pub type Result<T> = std::result::Result<T, InferError>;

/// Type inference errors. Any one of them aborts the enclosing inference.
#[derive(Debug, Clone, Error)]
pub enum InferError {
    #[error("Unbound variable '{name}'")]
    UnboundVariable { name: String },

    #[error("No type alias named '{name}'")]
    UnknownType { name: String },

    #[error("Couldn't unify {left} with {right}")]
    UnificationFail { left: Type, right: Type },

    #[error("Arity mismatch: {left} has {left_arity} members, {right} has {right_arity}")]
    UnificationMismatch {
        left: Type,
        right: Type,
        left_arity: usize,
        right_arity: usize,
    },

    #[error("{sub} is not a subtype of {sup}")]
    SubtypingFailure { sub: Type, sup: Type },

    #[error("Infinite type: {var} occurs in {ty}")]
    InfiniteType { var: Type, ty: Type },

    #[error("{ty} has the following extra properties: {}", .props.join(", "))]
    ExtraProperties { props: Vec<String>, ty: Type },

    #[error("{ty} is missing the following properties: {}", .props.join(", "))]
    MissingProperties { props: Vec<String>, ty: Type },

    #[error("Property '{key}' missing on {ty}")]
    PropertyMissing { key: MemberKey, ty: Type },

    #[error("Type '{name}' expects {expected} type params, got {found}")]
    TypeParamArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Index {index} is out of bounds for a tuple of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Property must be an identifier, a non-negative integer or a string, got {found}")]
    InvalidProperty { found: String },

    #[error("Member access '{key}' is not supported on {ty}")]
    UnsupportedMemberAccess { key: MemberKey, ty: Type },

    #[error("Can't use `await` inside non-async lambda")]
    AwaitOutsideAsync,

    #[error("Spread is only allowed as the last call argument or inside a tuple")]
    MisplacedRest,
}
