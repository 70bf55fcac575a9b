//! Key equality and deep equality.

use std::hash::{Hash, Hasher};
use std::mem;

use rustc_hash::FxHashSet;

use deepcopy_stack::ensure_sufficient_stack;

use super::{Channel, Function, MapData, OpaqueHandle, Shared, Value};

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Complex(a), Value::Complex(b)) => {
                a.re.to_bits() == b.re.to_bits() && a.im.to_bits() == b.im.to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array { ty: ta, items: a }, Value::Array { ty: tb, items: b })
            | (Value::Struct { ty: ta, fields: a }, Value::Struct { ty: tb, fields: b }) => {
                ta == tb && a == b
            }
            (Value::Pointer { ty: ta, target: a }, Value::Pointer { ty: tb, target: b }) => {
                ta == tb && same_cell(a.as_ref(), b.as_ref())
            }
            (Value::Slice { ty: ta, data: a }, Value::Slice { ty: tb, data: b }) => {
                ta == tb && same_cell(a.as_ref(), b.as_ref())
            }
            (Value::Map { ty: ta, data: a }, Value::Map { ty: tb, data: b }) => {
                ta == tb && same_cell(a.as_ref(), b.as_ref())
            }
            (Value::Chan { ty: ta, handle: a }, Value::Chan { ty: tb, handle: b }) => {
                ta == tb && a.as_ref().map(Channel::addr) == b.as_ref().map(Channel::addr)
            }
            (Value::Func { ty: ta, handle: a }, Value::Func { ty: tb, handle: b }) => {
                ta == tb && a.as_ref().map(Function::addr) == b.as_ref().map(Function::addr)
            }
            (Value::Opaque { ty: ta, handle: a }, Value::Opaque { ty: tb, handle: b }) => {
                ta == tb && a.as_ref().map(OpaqueHandle::addr) == b.as_ref().map(OpaqueHandle::addr)
            }
            (Value::Interface { ty: ta, inner: a }, Value::Interface { ty: tb, inner: b }) => {
                ta == tb && a == b
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

fn same_cell<T>(a: Option<&Shared<T>>, b: Option<&Shared<T>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Uint(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Complex(c) => {
                c.re.to_bits().hash(state);
                c.im.to_bits().hash(state);
            }
            Value::Str(s) => s.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Array { ty, items: values } | Value::Struct { ty, fields: values } => {
                ty.hash(state);
                values.hash(state);
            }
            Value::Pointer { ty, target } => {
                ty.hash(state);
                target.as_ref().map(Shared::addr).hash(state);
            }
            Value::Slice { ty, data } => {
                ty.hash(state);
                data.as_ref().map(Shared::addr).hash(state);
            }
            Value::Map { ty, data } => {
                ty.hash(state);
                data.as_ref().map(Shared::addr).hash(state);
            }
            Value::Chan { ty, handle } => {
                ty.hash(state);
                handle.as_ref().map(Channel::addr).hash(state);
            }
            Value::Func { ty, handle } => {
                ty.hash(state);
                handle.as_ref().map(Function::addr).hash(state);
            }
            Value::Opaque { ty, handle } => {
                ty.hash(state);
                handle.as_ref().map(OpaqueHandle::addr).hash(state);
            }
            Value::Interface { ty, inner } => {
                ty.hash(state);
                inner.hash(state);
            }
        }
    }
}

impl Value {
    /// Structural equality over whole graphs.
    ///
    /// Pointers, slices and maps are compared through their targets; nil and
    /// empty are different. Channels, functions and opaque handles compare
    /// by identity. Cycles are handled: a pair of cells already under
    /// comparison is assumed equal.
    pub fn deep_eq(&self, other: &Value) -> bool {
        DeepEq::default().eq(self, other)
    }
}

#[derive(Default)]
struct DeepEq {
    /// Address pairs currently assumed equal.
    assumed: FxHashSet<(usize, usize)>,
}

impl DeepEq {
    fn eq(&mut self, a: &Value, b: &Value) -> bool {
        ensure_sufficient_stack(|| self.eq_inner(a, b))
    }

    fn eq_inner(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Array { ty: ta, items: a }, Value::Array { ty: tb, items: b })
            | (Value::Struct { ty: ta, fields: a }, Value::Struct { ty: tb, fields: b }) => {
                ta == tb && self.eq_all(a, b)
            }
            (Value::Pointer { ty: ta, target: a }, Value::Pointer { ty: tb, target: b }) => {
                ta == tb
                    && match (a, b) {
                        (None, None) => true,
                        (Some(a), Some(b)) => {
                            self.assume(a.addr(), b.addr()) || self.eq(&a.read(), &b.read())
                        }
                        _ => false,
                    }
            }
            (Value::Slice { ty: ta, data: a }, Value::Slice { ty: tb, data: b }) => {
                ta == tb
                    && match (a, b) {
                        (None, None) => true,
                        (Some(a), Some(b)) => {
                            self.assume(a.addr(), b.addr()) || self.eq_all(&a.read(), &b.read())
                        }
                        _ => false,
                    }
            }
            (Value::Map { ty: ta, data: a }, Value::Map { ty: tb, data: b }) => {
                ta == tb
                    && match (a, b) {
                        (None, None) => true,
                        (Some(a), Some(b)) => {
                            self.assume(a.addr(), b.addr()) || self.eq_maps(a, b)
                        }
                        _ => false,
                    }
            }
            (Value::Interface { ty: ta, inner: a }, Value::Interface { ty: tb, inner: b }) => {
                ta == tb
                    && match (a, b) {
                        (None, None) => true,
                        (Some(a), Some(b)) => self.eq(a, b),
                        _ => false,
                    }
            }
            // Scalars and identity-compared handles.
            _ => a == b,
        }
    }

    /// Record `(a, b)` as under comparison. True if it already was.
    fn assume(&mut self, a: usize, b: usize) -> bool {
        a == b || !self.assumed.insert((a, b))
    }

    fn eq_all(&mut self, a: &[Value], b: &[Value]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.eq(a, b))
    }

    fn eq_maps(&mut self, a: &Shared<MapData>, b: &Shared<MapData>) -> bool {
        let a = a.read();
        let b = b.read();
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|(key, value)| {
            if let Some(other) = b.get(key) {
                return self.eq(value, other);
            }
            // Keys holding handles differ by identity between a graph and
            // its copy; fall back to a deep key match.
            b.iter()
                .find(|(other_key, _)| key.deep_eq(other_key))
                .is_some_and(|(_, other)| self.eq(value, other))
        })
    }
}
