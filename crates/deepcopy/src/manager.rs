//! Type-analysis cache and value-level copy entry point.
//!
//! Analyses are keyed by type descriptor and computed at most once per
//! manager, however many threads ask at the same time.

use std::sync::{Arc, LazyLock};

use crate::analysis::{self, TypeAnalysis};
use crate::config::{global_flags, CopyFlags};
use crate::hooks::has_override;
use crate::once_map::OnceMap;
use crate::traverse::deep_copy;
use crate::types::Ty;
use crate::value::Value;

/// Cache of type analyses plus the engine flags used for copies made
/// through it.
pub struct DeepCopyManager {
    analyses: OnceMap<Ty, Arc<TypeAnalysis>>,
    flags: CopyFlags,
}

static DEFAULT_MANAGER: LazyLock<DeepCopyManager> = LazyLock::new(DeepCopyManager::new);

/// The process-wide manager used by the façade functions.
pub fn default_manager() -> &'static DeepCopyManager {
    &DEFAULT_MANAGER
}

impl DeepCopyManager {
    /// A manager with an empty cache and the process-wide flags.
    pub fn new() -> Self {
        Self::with_flags(global_flags())
    }

    pub fn with_flags(flags: CopyFlags) -> Self {
        DeepCopyManager {
            analyses: OnceMap::new(),
            flags,
        }
    }

    pub fn flags(&self) -> CopyFlags {
        self.flags
    }

    /// The analysis of `ty`, computed on first request.
    pub fn analyze(&self, ty: Ty) -> Arc<TypeAnalysis> {
        self.analyses
            .get_or_init(&ty, || Arc::new(analysis::analyze(ty)))
    }

    /// The analysis of `value`'s type. The untyped nil analyzes as `nil`.
    pub fn analyze_value(&self, value: &Value) -> Arc<TypeAnalysis> {
        if value.is_untyped_nil() {
            return Arc::new(TypeAnalysis::nil());
        }
        self.analyze(value.ty())
    }

    /// Deep-copy `value`.
    ///
    /// The untyped nil and values whose type is value-only come back as a
    /// plain clone; everything else goes through the engine.
    pub fn copy_value(&self, value: &Value) -> Value {
        if value.is_untyped_nil() {
            return value.clone();
        }
        let ty = value.ty();
        if !has_override(ty) && self.analyze(ty).is_only_values {
            return value.clone();
        }
        deep_copy(value, None, self.flags)
    }

    /// Types analyzed so far, in no particular order.
    pub fn cached_types(&self) -> Vec<Ty> {
        self.analyses.keys()
    }

    /// Forget every analysis. Later requests recompute.
    pub fn clear_cache(&self) {
        self.analyses.clear();
    }
}

impl Default for DeepCopyManager {
    fn default() -> Self {
        Self::new()
    }
}
