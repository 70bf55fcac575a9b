//! The copy engine.
//!
//! Walks a value graph by kind and builds an independent copy. Every heap
//! cell reached is copied once: the visitation table maps a source cell's
//! address to the copy made for it, and is filled *before* the cell's
//! contents are copied, so a cycle back to the cell finds the copy instead
//! of recursing. Two references to one source cell end up as two references
//! to one copied cell.
//!
//! # Per-kind policy
//!
//! - Scalars and nil references: returned as-is.
//! - Pointers: visitation table, then hooks, then a fresh cell.
//! - Slices and maps: fresh storage (slices keep their capacity; map keys
//!   are copied too). With [`CopyFlags::TRACK_CONTAINERS`] their storage
//!   joins the visitation table like a pointer's cell.
//! - Records: hook, or field by field. Private fields come out zeroed.
//! - Arrays and interfaces: element by element, concrete value re-wrapped.
//! - Channels, functions, opaque handles: the same handle.
//!
//! Source cells are read-locked while their contents are copied; hooks
//! must not write to the graph they are copying.

use rustc_hash::{FxBuildHasher, FxHashMap};

use deepcopy_stack::with_stack_growth;

use crate::analysis::TypeAnalysis;
use crate::config::CopyFlags;
use crate::hooks::find_override;
use crate::types::Ty;
use crate::value::{MapData, Shared, Value};

/// Deep-copy `src`.
///
/// `plan` is a cached analysis of `src`'s type. Record fields it marks
/// value-only are copied without traversal. Ignored if it describes another
/// type.
pub(crate) fn deep_copy(src: &Value, plan: Option<&TypeAnalysis>, flags: CopyFlags) -> Value {
    let mut traversal = Traversal::new(flags);
    let copy = traversal.copy_planned(src, plan);
    tracing::trace!(
        ty = %src.ty(),
        nodes = traversal.nodes,
        cells = traversal.visited.len(),
        "deep copy finished"
    );
    copy
}

/// State of one top-level copy.
struct Traversal {
    /// Source cell address -> the value that references its copy.
    visited: FxHashMap<usize, Value>,
    flags: CopyFlags,
    /// Composite nodes copied.
    nodes: usize,
}

impl Traversal {
    fn new(flags: CopyFlags) -> Self {
        Traversal {
            visited: FxHashMap::default(),
            flags,
            nodes: 0,
        }
    }

    fn copy(&mut self, src: &Value) -> Value {
        if is_leaf(src) {
            return src.clone();
        }
        with_stack_growth(self.flags.contains(CopyFlags::GROW_STACK), || {
            self.nodes += 1;
            self.copy_node(src)
        })
    }

    fn copy_planned(&mut self, src: &Value, plan: Option<&TypeAnalysis>) -> Value {
        match (src, plan) {
            (Value::Struct { ty, fields }, Some(plan)) if plan.ty == Some(*ty) => {
                with_stack_growth(self.flags.contains(CopyFlags::GROW_STACK), || {
                    self.nodes += 1;
                    match apply_override(src) {
                        Some(copy) => copy,
                        None => self.copy_fields(*ty, fields, Some(plan)),
                    }
                })
            }
            _ => self.copy(src),
        }
    }

    fn copy_node(&mut self, src: &Value) -> Value {
        match src {
            Value::Pointer {
                ty,
                target: Some(target),
            } => self.copy_pointer(*ty, target, src),
            Value::Slice {
                ty,
                data: Some(data),
            } => self.copy_slice(*ty, data, src),
            Value::Map {
                ty,
                data: Some(data),
            } => self.copy_map(*ty, data, src),

            Value::Struct { ty, fields } => match apply_override(src) {
                Some(copy) => copy,
                None => self.copy_fields(*ty, fields, None),
            },
            Value::Array { ty, items } => match apply_override(src) {
                Some(copy) => copy,
                None => Value::Array {
                    ty: *ty,
                    items: items.iter().map(|item| self.copy(item)).collect(),
                },
            },
            Value::Interface {
                ty,
                inner: Some(inner),
            } => match apply_override(src) {
                Some(copy) => copy,
                None => Value::Interface {
                    ty: *ty,
                    inner: Some(Box::new(self.copy(inner))),
                },
            },

            // Shared by reference, unless the type knows better.
            Value::Chan { .. } | Value::Func { .. } | Value::Opaque { .. } => {
                apply_override(src).unwrap_or_else(|| src.clone())
            }

            // Leaves, filtered out by `copy`.
            _ => src.clone(),
        }
    }

    fn copy_pointer(&mut self, ty: Ty, target: &Shared<Value>, src: &Value) -> Value {
        let addr = target.addr();
        if let Some(copy) = self.visited.get(&addr) {
            return copy.clone();
        }

        if let Some(copy) = apply_override(src) {
            self.visited.insert(addr, copy.clone());
            return copy;
        }

        // Placeholder; nothing reads the new cell before it is filled below.
        let cell = Shared::new(Value::Bool(false));
        let copy = Value::Pointer {
            ty,
            target: Some(cell.clone()),
        };
        // Recorded before recursing: a cycle back to `target` must find it.
        self.visited.insert(addr, copy.clone());

        let value = self.copy(&target.read());
        *cell.write() = value;
        copy
    }

    fn copy_slice(&mut self, ty: Ty, data: &Shared<Vec<Value>>, src: &Value) -> Value {
        let addr = data.addr();
        let track = self.flags.contains(CopyFlags::TRACK_CONTAINERS);
        if track {
            if let Some(copy) = self.visited.get(&addr) {
                return copy.clone();
            }
        }

        if let Some(copy) = apply_override(src) {
            if track {
                self.visited.insert(addr, copy.clone());
            }
            return copy;
        }

        let source = data.read();
        let cell = Shared::new(Vec::new());
        let copy = Value::Slice {
            ty,
            data: Some(cell.clone()),
        };
        if track {
            self.visited.insert(addr, copy.clone());
        }

        let mut items = Vec::with_capacity(source.capacity());
        for item in source.iter() {
            items.push(self.copy(item));
        }
        *cell.write() = items;
        copy
    }

    fn copy_map(&mut self, ty: Ty, data: &Shared<MapData>, src: &Value) -> Value {
        let addr = data.addr();
        let track = self.flags.contains(CopyFlags::TRACK_CONTAINERS);
        if track {
            if let Some(copy) = self.visited.get(&addr) {
                return copy.clone();
            }
        }

        if let Some(copy) = apply_override(src) {
            if track {
                self.visited.insert(addr, copy.clone());
            }
            return copy;
        }

        let source = data.read();
        let cell = Shared::new(MapData::default());
        let copy = Value::Map {
            ty,
            data: Some(cell.clone()),
        };
        if track {
            self.visited.insert(addr, copy.clone());
        }

        let mut entries = MapData::with_capacity_and_hasher(source.len(), FxBuildHasher);
        for (key, value) in source.iter() {
            // Keys may hold references of their own.
            let key = self.copy(key);
            let value = self.copy(value);
            entries.insert(key, value);
        }
        *cell.write() = entries;
        copy
    }

    fn copy_fields(&mut self, ty: Ty, fields: &[Value], plan: Option<&TypeAnalysis>) -> Value {
        let declared = ty.struct_fields();
        let fields = declared
            .iter()
            .zip(fields)
            .map(|(field, value)| {
                if !field.is_exported() {
                    return Value::zero(field.ty);
                }
                match plan.and_then(|plan| plan.field(&field.name)) {
                    Some(analysis) if analysis.is_only_values => value.clone(),
                    Some(analysis) => self.copy_planned(value, Some(analysis)),
                    None => self.copy(value),
                }
            })
            .collect();
        Value::Struct { ty, fields }
    }
}

/// Values copied by plain clone: scalars and nil references.
fn is_leaf(value: &Value) -> bool {
    match value {
        Value::Bool(_)
        | Value::Int(_)
        | Value::Uint(_)
        | Value::Float(_)
        | Value::Complex(_)
        | Value::Str(_)
        | Value::Timestamp(_) => true,
        _ => value.is_nil(),
    }
}

fn apply_override(src: &Value) -> Option<Value> {
    find_override(src)?.apply(src)
}
