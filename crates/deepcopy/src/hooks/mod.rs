//! Per-type copy overrides.
//!
//! A type may supply its own copy operation. The engine prefers it over
//! structural copying wherever a value of that type is reached: at the top
//! of a façade call and at every node of a traversal.
//!
//! A hook attached to `*T` receives the pointer itself. A hook attached to
//! `T` also applies through a `*T`: the engine hands it the pointee and
//! places the result in a fresh cell. A hook returning `None`, or a value of
//! the wrong type, declines, and the node is copied structurally.

use std::sync::Arc;

use crate::reflect::Reflect;
use crate::types::{types, Kind, Ty};
use crate::value::{Shared, Value};

/// A type's own copy operation.
pub type CopyHook = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Wrap a closure as a [`CopyHook`].
pub fn copy_hook(hook: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static) -> CopyHook {
    Arc::new(hook)
}

/// A Rust type that knows how to copy itself.
///
/// Pair with [`self_copying`] to register the method as the copy hook of the
/// type's reflected descriptor. The engine then finds it wherever a value of
/// that type turns up, including behind pointers and inside containers.
pub trait SelfCopying: Reflect {
    fn self_copy(&self) -> Self;
}

/// A hook that rebuilds `T` from the value, calls [`SelfCopying::self_copy`]
/// and reflects the result. Declines when the value is not a `T`.
pub fn self_copying<T: SelfCopying + 'static>() -> CopyHook {
    copy_hook(|value| {
        let this = T::from_value(value.clone()).ok()?;
        Some(this.self_copy().to_value())
    })
}

/// Where a node's override comes from.
#[derive(Clone)]
pub(crate) enum Override {
    /// Hook on the node's own type.
    Direct(CopyHook),
    /// Hook on the pointee type of a non-nil pointer.
    Pointee(CopyHook),
}

/// Whether `ty`, or the element of a pointer type, carries a hook.
pub(crate) fn has_override(ty: Ty) -> bool {
    if types().copy_hook(ty).is_some() {
        return true;
    }
    match ty.kind() {
        Kind::Pointer(elem) => types().copy_hook(elem).is_some(),
        _ => false,
    }
}

/// The override for `value`, if its type or its pointee's type has one.
/// Nil values never reach a hook.
pub(crate) fn find_override(value: &Value) -> Option<Override> {
    let ty = value.ty();
    if ty.is_builtin() || value.is_nil() {
        return None;
    }
    if let Some(hook) = types().copy_hook(ty) {
        return Some(Override::Direct(hook));
    }
    match value {
        Value::Pointer {
            target: Some(_), ..
        } => pointee_type(ty)
            .and_then(|elem| types().copy_hook(elem))
            .map(Override::Pointee),
        _ => None,
    }
}

impl Override {
    /// Run the hook on `src`. `None` means fall back to structural copying.
    pub(crate) fn apply(&self, src: &Value) -> Option<Value> {
        let ty = src.ty();
        match self {
            Override::Direct(hook) => {
                let result = hook(src)?;
                if result.ty() == ty {
                    return Some(result);
                }
                // A pointer's hook may hand back the pointee.
                match pointee_type(ty) {
                    Some(elem) if result.ty() == elem => Some(Value::Pointer {
                        ty,
                        target: Some(Shared::new(result)),
                    }),
                    _ => declined(ty, &result),
                }
            }
            Override::Pointee(hook) => {
                let pointee = src.load()?;
                let elem = pointee.ty();
                let result = hook(&pointee)?;
                if result.ty() != elem {
                    return declined(elem, &result);
                }
                Some(Value::Pointer {
                    ty,
                    target: Some(Shared::new(result)),
                })
            }
        }
    }
}

fn pointee_type(ty: Ty) -> Option<Ty> {
    match ty.kind() {
        Kind::Pointer(elem) => Some(elem),
        _ => None,
    }
}

fn declined(expected: Ty, result: &Value) -> Option<Value> {
    tracing::debug!(
        expected = %expected,
        returned = %result.ty(),
        "copy hook returned a value of the wrong type; copying structurally"
    );
    None
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
