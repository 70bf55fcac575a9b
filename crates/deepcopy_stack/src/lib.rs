//! Stack growth for deep recursive walks.
//!
//! The copy engine and the type classifier both recurse once per nesting
//! level of the graph they walk. A linked list with a million nodes is a
//! perfectly valid input, so recursion depth is bounded by the input and
//! not by anything we control. Every recursive step goes through
//! [`ensure_sufficient_stack`], which moves execution onto a freshly
//! allocated stack segment when the current one runs low.
//!
//! On `wasm32` the guard is a plain call.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated stack segment (2MB).
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Run `f` under [`ensure_sufficient_stack`] when `enabled`, directly otherwise.
///
/// Callers that make growth configurable use this instead of branching at
/// every recursion site.
#[inline]
pub fn with_stack_growth<R>(enabled: bool, f: impl FnOnce() -> R) -> R {
    if enabled {
        ensure_sufficient_stack(f)
    } else {
        f()
    }
}
