//! Type analysis.
//!
//! Walks a type's shape to decide whether every value of the type can be
//! copied by plain value (no reachable substructure needs its own
//! allocation), and records which reference kinds occur below it.
//!
//! A pass memoizes every type it meets. A type met again while its own
//! analysis is still running (a recursive record reached through a pointer)
//! yields the in-progress placeholder instead of recursing: records cannot
//! contain themselves inline, so every back-edge passes through a reference
//! kind, which is already not value-only.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use deepcopy_stack::ensure_sufficient_stack;

use crate::types::{types, Kind, Ty};

bitflags! {
    /// Reference kinds reachable from a type.
    ///
    /// Informational: the copy decision rests on
    /// [`TypeAnalysis::is_only_values`] alone.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Contains: u8 {
        const PTR = 1 << 0;
        const SLICE = 1 << 1;
        const MAP = 1 << 2;
        const CHAN = 1 << 3;
        const FUNC = 1 << 4;
        const IFACE = 1 << 5;
    }
}

/// What analysis found out about one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeAnalysis {
    /// No reachable substructure needs its own allocation.
    pub is_only_values: bool,
    pub contains: Contains,
    /// Per exported field. Present for records only.
    pub field_analysis: Option<FxHashMap<Arc<str>, Arc<TypeAnalysis>>>,
    /// Diagnostic name; `nil` for the untyped nil.
    pub type_name: Arc<str>,
    /// The analyzed type. `None` for the untyped nil.
    pub ty: Option<Ty>,
}

impl TypeAnalysis {
    /// Result for the untyped nil: nothing to copy.
    pub fn nil() -> Self {
        TypeAnalysis {
            is_only_values: true,
            contains: Contains::empty(),
            field_analysis: None,
            type_name: Arc::from("nil"),
            ty: None,
        }
    }

    fn empty(ty: Ty, is_only_values: bool) -> Self {
        TypeAnalysis {
            is_only_values,
            contains: Contains::empty(),
            field_analysis: None,
            type_name: ty.name(),
            ty: Some(ty),
        }
    }

    #[inline]
    pub fn contains_ptr(&self) -> bool {
        self.contains.contains(Contains::PTR)
    }

    #[inline]
    pub fn contains_slice(&self) -> bool {
        self.contains.contains(Contains::SLICE)
    }

    #[inline]
    pub fn contains_map(&self) -> bool {
        self.contains.contains(Contains::MAP)
    }

    #[inline]
    pub fn contains_chan(&self) -> bool {
        self.contains.contains(Contains::CHAN)
    }

    #[inline]
    pub fn contains_func(&self) -> bool {
        self.contains.contains(Contains::FUNC)
    }

    #[inline]
    pub fn contains_iface(&self) -> bool {
        self.contains.contains(Contains::IFACE)
    }

    /// Analysis of an exported record field.
    pub fn field(&self, name: &str) -> Option<&TypeAnalysis> {
        self.field_analysis.as_ref()?.get(name).map(AsRef::as_ref)
    }
}

/// Analyze `ty` in a fresh pass.
pub(crate) fn analyze(ty: Ty) -> TypeAnalysis {
    let mut analyzer = Analyzer::default();
    let result = analyzer.analyze(ty);
    tracing::debug!(
        ty = %result.type_name,
        is_only_values = result.is_only_values,
        contains = ?result.contains,
        types_visited = analyzer.seen.len(),
        "analyzed type"
    );
    Arc::unwrap_or_clone(result)
}

/// One analysis pass.
#[derive(Default)]
struct Analyzer {
    /// Finished results and in-progress placeholders.
    seen: FxHashMap<Ty, Arc<TypeAnalysis>>,
}

impl Analyzer {
    fn analyze(&mut self, ty: Ty) -> Arc<TypeAnalysis> {
        if let Some(known) = self.seen.get(&ty) {
            return Arc::clone(known);
        }

        let kind = ty.kind();
        if kind.tag().is_scalar() {
            let result = Arc::new(TypeAnalysis::empty(ty, true));
            self.seen.insert(ty, Arc::clone(&result));
            return result;
        }

        self.seen
            .insert(ty, Arc::new(TypeAnalysis::empty(ty, false)));

        let mut result = ensure_sufficient_stack(|| self.analyze_kind(ty, kind));
        // The hook must run, whatever the shape says.
        if types().copy_hook(ty).is_some() {
            result.is_only_values = false;
        }

        let result = Arc::new(result);
        self.seen.insert(ty, Arc::clone(&result));
        result
    }

    fn analyze_kind(&mut self, ty: Ty, kind: Kind) -> TypeAnalysis {
        let mut result = TypeAnalysis::empty(ty, false);
        match kind {
            Kind::Array { elem, .. } => {
                let elem = self.analyze(elem);
                result.is_only_values = elem.is_only_values;
                result.contains = elem.contains;
            }

            Kind::Struct { fields } => {
                let mut only_values = true;
                let mut field_analysis = FxHashMap::default();
                for field in fields.iter() {
                    if !field.is_exported() {
                        // Skipped, but forces a traversal so the copy zeroes it.
                        only_values = false;
                        continue;
                    }
                    let analysis = self.analyze(field.ty);
                    only_values &= analysis.is_only_values;
                    result.contains |= analysis.contains;
                    field_analysis.insert(field.name.clone(), analysis);
                }
                result.is_only_values = only_values;
                result.field_analysis = Some(field_analysis);
            }

            Kind::Pointer(elem) => {
                let elem = self.analyze(elem);
                result.contains = Contains::PTR | elem.contains;
            }

            Kind::Slice(elem) => {
                let elem = self.analyze(elem);
                result.contains = Contains::SLICE | elem.contains;
            }

            Kind::Map { key, value } => {
                let key = self.analyze(key);
                let value = self.analyze(value);
                result.contains = Contains::MAP | key.contains | value.contains;
            }

            // Opaque: the element type says nothing about what a handle shares.
            Kind::Chan(_) => result.contains = Contains::CHAN,
            Kind::Func => result.contains = Contains::FUNC,
            // The concrete type is only known once a value exists.
            Kind::Interface => result.contains = Contains::IFACE,
            Kind::Opaque => {}

            Kind::Bool
            | Kind::Int
            | Kind::Uint
            | Kind::Float
            | Kind::Complex
            | Kind::Str
            | Kind::Timestamp => result.is_only_values = true,
        }
        result
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
