//! Call-site plans.
//!
//! A call site tags its copies with a key. The first copy under a key
//! analyzes the value's type once and stores the result as the key's plan;
//! every later copy under that key reuses the plan without looking at the
//! type again. The binding is permanent: a key first used with one type
//! keeps that type's plan even if later calls pass another type.
//! [`copy_with_key_checked`](crate::copy_with_key_checked) detects that.

use std::sync::{Arc, LazyLock};

use crate::analysis::TypeAnalysis;
use crate::manager::{default_manager, DeepCopyManager};
use crate::once_map::OnceMap;
use crate::types::Ty;

/// What a key resolved to the first time it was used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSitePlan {
    /// Copies under this key return their input unchanged.
    pub is_only_values: bool,
    pub analysis: Arc<TypeAnalysis>,
    /// The type first copied under this key. `None` for the untyped nil.
    pub ty: Option<Ty>,
}

/// Key -> plan, computed once per key.
pub struct CallSiteCache {
    plans: OnceMap<String, Arc<CallSitePlan>>,
}

static CALL_SITES: LazyLock<CallSiteCache> = LazyLock::new(CallSiteCache::new);

/// The process-wide call-site cache used by the façade.
pub fn call_sites() -> &'static CallSiteCache {
    &CALL_SITES
}

impl CallSiteCache {
    pub fn new() -> Self {
        CallSiteCache {
            plans: OnceMap::new(),
        }
    }

    /// The plan for `key`, analyzing `ty` with the default manager if the
    /// key is new. `ty` is ignored for known keys.
    pub fn get_or_create(&self, key: &str, ty: Option<Ty>) -> Arc<CallSitePlan> {
        self.get_or_create_with(key, ty, default_manager())
    }

    /// As [`get_or_create`](Self::get_or_create), analyzing through `manager`.
    pub fn get_or_create_with(
        &self,
        key: &str,
        ty: Option<Ty>,
        manager: &DeepCopyManager,
    ) -> Arc<CallSitePlan> {
        self.plans.get_or_init(key, || {
            let analysis = match ty {
                Some(ty) => manager.analyze(ty),
                None => Arc::new(TypeAnalysis::nil()),
            };
            tracing::debug!(
                key,
                ty = %analysis.type_name,
                is_only_values = analysis.is_only_values,
                "created call-site plan"
            );
            Arc::new(CallSitePlan {
                is_only_values: analysis.is_only_values,
                analysis,
                ty,
            })
        })
    }

    /// The plan for `key`, if one exists.
    pub fn get(&self, key: &str) -> Option<Arc<CallSitePlan>> {
        self.plans.get(key)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl Default for CallSiteCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use rayon::prelude::*;

    use super::*;
    use crate::types::StructBuilder;

    #[test]
    fn test_first_type_wins() {
        let cache = CallSiteCache::new();
        let first = cache.get_or_create("orders", Some(Ty::INT));
        assert!(first.is_only_values);
        assert_eq!(first.ty, Some(Ty::INT));

        let second = cache.get_or_create("orders", Some(Ty::pointer_to(Ty::INT)));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.is_only_values);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_nil_type_is_value_only() {
        let cache = CallSiteCache::new();
        let plan = cache.get_or_create("nothing", None);
        assert!(plan.is_only_values);
        assert_eq!(&*plan.analysis.type_name, "nil");
        assert_eq!(plan.ty, None);
    }

    #[test]
    fn test_plans_share_the_manager_analysis() {
        let manager = DeepCopyManager::new();
        let cache = CallSiteCache::new();
        let ty = Ty::slice_of(Ty::STR);
        let plan = cache.get_or_create_with("names", Some(ty), &manager);
        assert!(!plan.is_only_values);
        assert!(Arc::ptr_eq(&plan.analysis, &manager.analyze(ty)));
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let counted = StructBuilder::new("CallSiteCounted")
            .field("N", Ty::INT)
            .build()
            .unwrap();
        let cache = CallSiteCache::new();
        let manager = DeepCopyManager::new();

        let plans: Vec<Arc<CallSitePlan>> = (0..32)
            .into_par_iter()
            .map(|i| {
                // Racers disagree on the type; exactly one of them wins.
                let ty = if i % 2 == 0 { counted } else { Ty::STR };
                cache.get_or_create_with("hot", Some(ty), &manager)
            })
            .collect();

        assert!(plans.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
        let winner = cache.get("hot").unwrap();
        assert!(winner.ty == Some(counted) || winner.ty == Some(Ty::STR));
        assert_eq!(manager.cached_types(), vec![winner.ty.unwrap()]);
        assert!(cache.get("cold").is_none());
    }
}
