//! Runtime values.
//!
//! A [`Value`] is a typed instance of something in the [`TypePool`]. Scalars
//! and inline aggregates (arrays, records) are held by value; everything
//! reachable through indirection lives behind a [`Shared`] cell, so two
//! values can alias the same substructure and graphs can contain cycles.
//!
//! # Equality
//!
//! `PartialEq`, `Eq` and `Hash` implement map-key equality: scalars and
//! inline aggregates compare structurally (floats by bit pattern), handles
//! compare by identity. Use [`Value::deep_eq`] to compare whole graphs.
//!
//! [`TypePool`]: crate::TypePool

mod eq;
mod handles;
mod shared;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rustc_hash::FxHashMap;

pub use handles::{Channel, Complex, Function, OpaqueHandle};
pub use shared::Shared;

use crate::types::{Kind, Ty};

/// Storage behind a map value.
pub type MapData = FxHashMap<Value, Value>;

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(Complex),
    Str(Arc<str>),
    Timestamp(SystemTime),

    /// Fixed-length array, held inline.
    Array { ty: Ty, items: Vec<Value> },
    /// Record, held inline. Fields are positional, in declaration order.
    Struct { ty: Ty, fields: Vec<Value> },

    /// `None` is the nil pointer.
    Pointer {
        ty: Ty,
        target: Option<Shared<Value>>,
    },
    /// `None` is the nil slice, distinct from an empty one.
    Slice {
        ty: Ty,
        data: Option<Shared<Vec<Value>>>,
    },
    /// `None` is the nil map, distinct from an empty one.
    Map {
        ty: Ty,
        data: Option<Shared<MapData>>,
    },
    Chan { ty: Ty, handle: Option<Channel> },
    Func { ty: Ty, handle: Option<Function> },
    /// A dynamic interface. `inner` carries its own concrete type.
    Interface {
        ty: Ty,
        inner: Option<Box<Value>>,
    },
    Opaque {
        ty: Ty,
        handle: Option<OpaqueHandle>,
    },
}

// Factory methods

impl Value {
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    #[inline]
    pub fn uint(n: u64) -> Self {
        Value::Uint(n)
    }

    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex(Complex::new(re, im))
    }

    pub fn timestamp(at: SystemTime) -> Self {
        Value::Timestamp(at)
    }

    /// A new heap cell holding `target`, and a pointer to it.
    pub fn pointer(target: Value) -> Self {
        Value::Pointer {
            ty: Ty::pointer_to(target.ty()),
            target: Some(Shared::new(target)),
        }
    }

    /// A pointer to an existing cell.
    pub fn pointer_at(elem: Ty, target: Shared<Value>) -> Self {
        Value::Pointer {
            ty: Ty::pointer_to(elem),
            target: Some(target),
        }
    }

    pub fn nil_pointer(elem: Ty) -> Self {
        Value::Pointer {
            ty: Ty::pointer_to(elem),
            target: None,
        }
    }

    /// A slice whose capacity equals its length.
    pub fn slice(elem: Ty, items: Vec<Value>) -> Self {
        Value::Slice {
            ty: Ty::slice_of(elem),
            data: Some(Shared::new(items)),
        }
    }

    /// A slice with at least `capacity` reserved.
    pub fn slice_with_capacity(elem: Ty, mut items: Vec<Value>, capacity: usize) -> Self {
        items.reserve_exact(capacity.saturating_sub(items.len()));
        Value::slice(elem, items)
    }

    pub fn nil_slice(elem: Ty) -> Self {
        Value::Slice {
            ty: Ty::slice_of(elem),
            data: None,
        }
    }

    pub fn map(key: Ty, value: Ty, entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map {
            ty: Ty::map_of(key, value),
            data: Some(Shared::new(entries.into_iter().collect())),
        }
    }

    pub fn nil_map(key: Ty, value: Ty) -> Self {
        Value::Map {
            ty: Ty::map_of(key, value),
            data: None,
        }
    }

    pub fn array(elem: Ty, items: Vec<Value>) -> Self {
        Value::Array {
            ty: Ty::array_of(elem, items.len()),
            items,
        }
    }

    /// A record from positional field values.
    pub fn structure(ty: Ty, fields: Vec<Value>) -> Self {
        debug_assert_eq!(
            fields.len(),
            ty.struct_fields().len(),
            "record `{}` built with the wrong number of fields",
            ty.name()
        );
        Value::Struct { ty, fields }
    }

    /// A record from named field values. Fields not named stay zero.
    ///
    /// # Panics
    ///
    /// Panics if a name is not a field of `ty`.
    pub fn record<'a>(ty: Ty, named: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let mut record = Value::zero(ty);
        for (name, value) in named {
            assert!(
                record.set_field(name, value),
                "record `{}` has no field `{name}`",
                ty.name()
            );
        }
        record
    }

    /// `inner` stored in an interface of type `ty`.
    pub fn interface(ty: Ty, inner: Value) -> Self {
        Value::Interface {
            ty,
            inner: Some(Box::new(inner)),
        }
    }

    /// `inner` stored in the empty interface.
    pub fn any(inner: Value) -> Self {
        Value::interface(Ty::ANY, inner)
    }

    pub fn nil_interface(ty: Ty) -> Self {
        Value::Interface { ty, inner: None }
    }

    /// The untyped nil: an empty `any`.
    pub fn nil() -> Self {
        Value::nil_interface(Ty::ANY)
    }

    pub fn chan(elem: Ty, handle: Channel) -> Self {
        Value::Chan {
            ty: Ty::chan_of(elem),
            handle: Some(handle),
        }
    }

    pub fn func(ty: Ty, handle: Function) -> Self {
        Value::Func {
            ty,
            handle: Some(handle),
        }
    }

    pub fn opaque(ty: Ty, handle: OpaqueHandle) -> Self {
        Value::Opaque {
            ty,
            handle: Some(handle),
        }
    }

    /// The zero value of `ty`: false, 0, "", the epoch, nil for every
    /// reference kind, and zeroed elements for inline aggregates.
    pub fn zero(ty: Ty) -> Self {
        match ty.kind() {
            Kind::Bool => Value::Bool(false),
            Kind::Int => Value::Int(0),
            Kind::Uint => Value::Uint(0),
            Kind::Float => Value::Float(0.0),
            Kind::Complex => Value::Complex(Complex::default()),
            Kind::Str => Value::Str(Arc::from("")),
            Kind::Timestamp => Value::Timestamp(UNIX_EPOCH),
            Kind::Array { elem, len } => Value::Array {
                ty,
                items: vec![Value::zero(elem); len],
            },
            Kind::Struct { fields } => Value::Struct {
                ty,
                fields: fields.iter().map(|field| Value::zero(field.ty)).collect(),
            },
            Kind::Pointer(_) => Value::Pointer { ty, target: None },
            Kind::Slice(_) => Value::Slice { ty, data: None },
            Kind::Map { .. } => Value::Map { ty, data: None },
            Kind::Chan(_) => Value::Chan { ty, handle: None },
            Kind::Func => Value::Func { ty, handle: None },
            Kind::Interface => Value::Interface { ty, inner: None },
            Kind::Opaque => Value::Opaque { ty, handle: None },
        }
    }
}

// Queries

impl Value {
    /// The value's static type.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Bool(_) => Ty::BOOL,
            Value::Int(_) => Ty::INT,
            Value::Uint(_) => Ty::UINT,
            Value::Float(_) => Ty::FLOAT,
            Value::Complex(_) => Ty::COMPLEX,
            Value::Str(_) => Ty::STR,
            Value::Timestamp(_) => Ty::TIMESTAMP,
            Value::Array { ty, .. }
            | Value::Struct { ty, .. }
            | Value::Pointer { ty, .. }
            | Value::Slice { ty, .. }
            | Value::Map { ty, .. }
            | Value::Chan { ty, .. }
            | Value::Func { ty, .. }
            | Value::Interface { ty, .. }
            | Value::Opaque { ty, .. } => *ty,
        }
    }

    /// Whether this is a reference kind with no target.
    pub fn is_nil(&self) -> bool {
        match self {
            Value::Pointer { target, .. } => target.is_none(),
            Value::Slice { data, .. } => data.is_none(),
            Value::Map { data, .. } => data.is_none(),
            Value::Chan { handle, .. } => handle.is_none(),
            Value::Func { handle, .. } => handle.is_none(),
            Value::Interface { inner, .. } => inner.is_none(),
            Value::Opaque { handle, .. } => handle.is_none(),
            _ => false,
        }
    }

    /// Whether this is an empty `any`, which has no concrete type at all.
    pub fn is_untyped_nil(&self) -> bool {
        matches!(self, Value::Interface { ty, inner: None } if *ty == Ty::ANY)
    }

    /// Field of a record, by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let Value::Struct { ty, fields } = self else {
            return None;
        };
        let index = field_index(*ty, name)?;
        fields.get(index)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        let Value::Struct { ty, fields } = self else {
            return None;
        };
        let index = field_index(*ty, name)?;
        fields.get_mut(index)
    }

    /// Overwrite a record field. Returns `false` if there is no such field.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.field_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Target cell of a non-nil pointer.
    pub fn as_pointer(&self) -> Option<&Shared<Value>> {
        match self {
            Value::Pointer { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Backing cell of a non-nil slice.
    pub fn as_slice(&self) -> Option<&Shared<Vec<Value>>> {
        match self {
            Value::Slice { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// Backing cell of a non-nil map.
    pub fn as_map(&self) -> Option<&Shared<MapData>> {
        match self {
            Value::Map { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Concrete value held by a non-nil interface.
    pub fn as_interface(&self) -> Option<&Value> {
        match self {
            Value::Interface { inner, .. } => inner.as_deref(),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Value::Chan { handle, .. } => handle.as_ref(),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Func { handle, .. } => handle.as_ref(),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&OpaqueHandle> {
        match self {
            Value::Opaque { handle, .. } => handle.as_ref(),
            _ => None,
        }
    }

    /// A copy of what a non-nil pointer points at.
    pub fn load(&self) -> Option<Value> {
        self.as_pointer().map(|cell| cell.read().clone())
    }
}

fn field_index(ty: Ty, name: &str) -> Option<usize> {
    ty.struct_fields()
        .iter()
        .position(|field| &*field.name == name)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
