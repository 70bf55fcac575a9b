//! Cycle-safe deep copy of reflected value graphs.
//!
//! Values are described by handles into a process-wide [`TypePool`] and
//! represented as [`Value`] graphs whose reference kinds (pointers, slices,
//! maps) live behind shared cells. A deep copy allocates a fresh cell for
//! every cell reachable from the source, once each: cycles and shared
//! substructure come out with the same topology they went in with.
//!
//! # Pipeline
//!
//! 1. **Analysis**: a type is classified once per process as value-only or
//!    not. Value-only types (no reachable indirection, no copy hook) are
//!    returned as a plain clone without traversal.
//! 2. **Overrides**: a type may carry its own copy operation (a
//!    [`CopyHook`], or a Rust type implementing [`SelfCopying`]); the
//!    engine uses it wherever a value of that type is reached.
//! 3. **Traversal**: everything else is walked by kind with a per-call
//!    visitation table.
//!
//! # Entry points
//!
//! - [`copy`] / [`try_copy`]: any `T: Reflect`.
//! - [`copy_with_key`] / [`copy_with_key_checked`]: the analysis is looked
//!   up by a caller-chosen key instead of by type.
//! - [`analyze_type`]: the classification alone.
//! - [`DeepCopyManager`]: an isolated analysis cache for dynamic values.
//!
//! # Logging
//!
//! Analysis and plan creation log at `debug`, per-copy statistics at
//! `trace`. Call [`init_tracing`] and set `RUST_LOG=deepcopy=debug` to see
//! them.
//!
//! # Configuration
//!
//! Engine switches are read once from `DEEPCOPY_FLAGS`; see [`CopyFlags`].

mod analysis;
mod call_site;
mod config;
mod error;
mod hooks;
mod manager;
mod once_map;
mod reflect;
mod traverse;
mod types;
mod value;

use std::sync::Arc;

pub use analysis::{Contains, TypeAnalysis};
pub use call_site::{call_sites, CallSiteCache, CallSitePlan};
pub use config::{global_flags, CopyFlags, CONFIG_ENV};
pub use error::{CopyError, ReflectError, TypeError};
pub use hooks::{copy_hook, self_copying, CopyHook, SelfCopying};
pub use manager::{default_manager, DeepCopyManager};
pub use reflect::Reflect;
pub use types::{types, Field, Kind, StructBuilder, Tag, Ty, TypePool, Visibility};
pub use value::{Channel, Complex, Function, MapData, OpaqueHandle, Shared, Value};

use hooks::has_override;
use traverse::deep_copy;

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, when called again, or when the
/// host already installed a global subscriber.
pub fn init_tracing() {
    use std::sync::Once;
    static TRACING_INIT: Once = Once::new();

    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(EnvFilter::from_default_env())
                .try_init();
        }
    });
}

/// Deep-copy `src`.
///
/// # Panics
///
/// When a copy hook returns a value that `T` cannot be rebuilt from. Use
/// [`try_copy`] to get that as an error.
pub fn copy<T: Reflect + Clone>(src: &T) -> T {
    match try_copy(src) {
        Ok(copy) => copy,
        Err(err) => panic!("deep copy failed: {err}"),
    }
}

/// Deep-copy `src`, reporting hook results `T` cannot be rebuilt from.
pub fn try_copy<T: Reflect + Clone>(src: &T) -> Result<T, CopyError> {
    if src.is_untyped_nil() {
        return Ok(src.clone());
    }
    let manager = default_manager();
    let ty = src.reflect_type();
    if !has_override(ty) && manager.analyze(ty).is_only_values {
        return Ok(src.clone());
    }
    let copy = deep_copy(&src.to_value(), None, manager.flags());
    Ok(T::from_value(copy)?)
}

/// Deep-copy `src` with the analysis cached under `key`.
///
/// The first call with a given key fixes the key's plan to the type of
/// that call's value. Later calls reuse the plan whatever they pass: a key
/// must only ever be used with one type. A value-only plan returns `src`
/// unchanged even if `src` is of some other, reference-bearing type.
///
/// # Panics
///
/// As [`copy`].
pub fn copy_with_key<T: Reflect + Clone>(src: &T, key: &str) -> T {
    let plan = call_sites().get_or_create(key, typed(src));
    match copy_with_plan(src, &plan) {
        Ok(copy) => copy,
        Err(err) => panic!("deep copy under key `{key}` failed: {err}"),
    }
}

/// As [`copy_with_key`], but fails with [`CopyError::KeyTypeMismatch`] when
/// `key` is bound to a type other than `src`'s.
pub fn copy_with_key_checked<T: Reflect + Clone>(src: &T, key: &str) -> Result<T, CopyError> {
    let requested = typed(src);
    let plan = call_sites().get_or_create(key, requested);
    if plan.ty != requested {
        return Err(CopyError::KeyTypeMismatch {
            key: key.to_owned(),
            bound: plan.analysis.type_name.to_string(),
            requested: requested.map_or_else(|| "nil".to_owned(), |ty| ty.name().to_string()),
        });
    }
    copy_with_plan(src, &plan)
}

fn copy_with_plan<T: Reflect + Clone>(src: &T, plan: &CallSitePlan) -> Result<T, CopyError> {
    if plan.is_only_values {
        return Ok(src.clone());
    }
    let copy = deep_copy(&src.to_value(), Some(&plan.analysis), default_manager().flags());
    Ok(T::from_value(copy)?)
}

/// The classification of `src`'s type. The untyped nil yields
/// [`TypeAnalysis::nil`].
pub fn analyze_type<T: Reflect>(src: &T) -> Arc<TypeAnalysis> {
    match typed(src) {
        Some(ty) => default_manager().analyze(ty),
        None => Arc::new(TypeAnalysis::nil()),
    }
}

fn typed<T: Reflect>(src: &T) -> Option<Ty> {
    if src.is_untyped_nil() {
        None
    } else {
        Some(src.reflect_type())
    }
}
