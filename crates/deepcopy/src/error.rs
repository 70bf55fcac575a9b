//! Error types.
//!
//! Traversal itself never fails: every kind has a copy policy. Errors come
//! from declaring types, from rebuilding a static Rust type out of a copied
//! value, and from the opt-in call-site type check.

use thiserror::Error;

/// A rejected type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("record `{name}` is already defined")]
    AlreadyDefined { name: String },

    #[error("`{name}` is not a record type")]
    NotAStruct { name: String },

    #[error("record `{ty}` declares field `{field}` more than once")]
    DuplicateField { ty: String, field: String },

    #[error("record `{name}` contains itself without indirection")]
    RecursiveInline { name: String },

    #[error("built-in type `{name}` cannot carry a copy hook")]
    BuiltinHook { name: String },
}

/// A value that does not have the shape a Rust type expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReflectError {
    #[error("expected a value of type `{expected}`, found `{found}`")]
    Mismatch { expected: String, found: String },

    #[error("{value} does not fit in `{target}`")]
    OutOfRange { value: String, target: &'static str },
}

impl ReflectError {
    pub fn mismatch(expected: impl Into<String>, found: &crate::Value) -> Self {
        ReflectError::Mismatch {
            expected: expected.into(),
            found: found.ty().name().to_string(),
        }
    }
}

/// Failure of a façade copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyError {
    /// A copy hook produced a value the requested type cannot be rebuilt from.
    #[error(transparent)]
    Reflect(#[from] ReflectError),

    /// The call-site key is bound to a different type.
    #[error("call-site key `{key}` is bound to `{bound}`, not `{requested}`")]
    KeyTypeMismatch {
        key: String,
        bound: String,
        requested: String,
    },
}
