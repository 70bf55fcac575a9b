//! Bridge between Rust types and [`Value`]s.
//!
//! The façade works on any `T: Reflect`: it reflects the input into a
//! value graph, copies the graph, and rebuilds a `T` from the copy.
//! Records implement the trait by hand, mapping to a `Value::Struct` of a
//! pool-declared type.
//!
//! Owned containers map onto the reference kinds:
//!
//! | Rust | Kind |
//! |---|---|
//! | `Vec<T>` | `[]T` (capacity kept) |
//! | `Box<T>`, `Option<Box<T>>` | `*T` (`None` is nil) |
//! | `HashMap<K, V, S>` | `map[K]V` |
//!
//! A Rust owner cannot hold a nil slice or map; both come back empty.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::ReflectError;
use crate::types::Ty;
use crate::value::{Complex, MapData, Shared, Value};

/// A Rust type with a runtime type descriptor and a value representation.
pub trait Reflect: Sized {
    /// Type descriptor of every value of this Rust type.
    fn static_type() -> Ty;

    /// Type descriptor of this value. Differs from [`static_type`] only for
    /// dynamically typed carriers such as [`Value`].
    ///
    /// [`static_type`]: Reflect::static_type
    fn reflect_type(&self) -> Ty {
        Self::static_type()
    }

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ReflectError>;

    /// Whether this is a nil with no concrete type. Such inputs are
    /// returned as-is and analyze as `nil`.
    fn is_untyped_nil(&self) -> bool {
        false
    }
}

impl Reflect for Value {
    fn static_type() -> Ty {
        Ty::ANY
    }

    fn reflect_type(&self) -> Ty {
        self.ty()
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        Ok(value)
    }

    fn is_untyped_nil(&self) -> bool {
        Value::is_untyped_nil(self)
    }
}

impl Reflect for bool {
    fn static_type() -> Ty {
        Ty::BOOL
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ReflectError::mismatch("bool", &other)),
        }
    }
}

macro_rules! reflect_integers {
    ($variant:ident, $wide:ty, $ty:expr, $name:literal: $($int:ty),*) => {$(
        impl Reflect for $int {
            fn static_type() -> Ty {
                $ty
            }

            fn to_value(&self) -> Value {
                Value::$variant(<$wide>::from(*self))
            }

            fn from_value(value: Value) -> Result<Self, ReflectError> {
                match value {
                    Value::$variant(n) => <$int>::try_from(n).map_err(|_| ReflectError::OutOfRange {
                        value: n.to_string(),
                        target: stringify!($int),
                    }),
                    other => Err(ReflectError::mismatch($name, &other)),
                }
            }
        }
    )*};
}

reflect_integers!(Int, i64, Ty::INT, "int": i8, i16, i32, i64);
reflect_integers!(Uint, u64, Ty::UINT, "uint": u8, u16, u32, u64);

impl Reflect for isize {
    fn static_type() -> Ty {
        Ty::INT
    }

    fn to_value(&self) -> Value {
        // Saturates only where isize is wider than 64 bits.
        let n = i64::try_from(*self).unwrap_or(if *self < 0 { i64::MIN } else { i64::MAX });
        Value::Int(n)
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Int(n) => isize::try_from(n).map_err(|_| ReflectError::OutOfRange {
                value: n.to_string(),
                target: "isize",
            }),
            other => Err(ReflectError::mismatch("int", &other)),
        }
    }
}

impl Reflect for usize {
    fn static_type() -> Ty {
        Ty::UINT
    }

    fn to_value(&self) -> Value {
        Value::Uint(u64::try_from(*self).unwrap_or(u64::MAX))
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Uint(n) => usize::try_from(n).map_err(|_| ReflectError::OutOfRange {
                value: n.to_string(),
                target: "usize",
            }),
            other => Err(ReflectError::mismatch("uint", &other)),
        }
    }
}

impl Reflect for f64 {
    fn static_type() -> Ty {
        Ty::FLOAT
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Float(f) => Ok(f),
            other => Err(ReflectError::mismatch("float", &other)),
        }
    }
}

impl Reflect for f32 {
    fn static_type() -> Ty {
        Ty::FLOAT
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "floats are stored widened; narrowing restores the original"
            )]
            Value::Float(f) => Ok(f as f32),
            other => Err(ReflectError::mismatch("float", &other)),
        }
    }
}

impl Reflect for Complex {
    fn static_type() -> Ty {
        Ty::COMPLEX
    }

    fn to_value(&self) -> Value {
        Value::Complex(*self)
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Complex(c) => Ok(c),
            other => Err(ReflectError::mismatch("complex", &other)),
        }
    }
}

impl Reflect for String {
    fn static_type() -> Ty {
        Ty::STR
    }

    fn to_value(&self) -> Value {
        Value::Str(Arc::from(self.as_str()))
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(ReflectError::mismatch("str", &other)),
        }
    }
}

impl Reflect for Arc<str> {
    fn static_type() -> Ty {
        Ty::STR
    }

    fn to_value(&self) -> Value {
        Value::Str(Arc::clone(self))
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ReflectError::mismatch("str", &other)),
        }
    }
}

impl Reflect for SystemTime {
    fn static_type() -> Ty {
        Ty::TIMESTAMP
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            other => Err(ReflectError::mismatch("timestamp", &other)),
        }
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn static_type() -> Ty {
        Ty::slice_of(T::static_type())
    }

    fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.capacity());
        items.extend(self.iter().map(Reflect::to_value));
        Value::Slice {
            ty: Self::static_type(),
            data: Some(Shared::new(items)),
        }
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Slice { data: Some(data), .. } => {
                let items = data.read();
                let mut out = Vec::with_capacity(items.capacity());
                for item in items.iter() {
                    out.push(T::from_value(item.clone())?);
                }
                Ok(out)
            }
            Value::Slice { data: None, .. } => Ok(Vec::new()),
            other => Err(ReflectError::mismatch(Self::static_type().name().to_string(), &other)),
        }
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn static_type() -> Ty {
        Ty::pointer_to(T::static_type())
    }

    fn to_value(&self) -> Value {
        Value::pointer_at(T::static_type(), Shared::new(T::to_value(self)))
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Pointer {
                target: Some(cell), ..
            } => {
                let pointee = cell.read().clone();
                Ok(Box::new(T::from_value(pointee)?))
            }
            other => Err(ReflectError::mismatch(Self::static_type().name().to_string(), &other)),
        }
    }
}

impl<T: Reflect> Reflect for Option<Box<T>> {
    fn static_type() -> Ty {
        Ty::pointer_to(T::static_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(boxed) => <Box<T> as Reflect>::to_value(boxed),
            None => Value::nil_pointer(T::static_type()),
        }
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Pointer { target: None, .. } => Ok(None),
            other => <Box<T>>::from_value(other).map(Some),
        }
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Default,
{
    fn static_type() -> Ty {
        Ty::map_of(K::static_type(), V::static_type())
    }

    fn to_value(&self) -> Value {
        let entries: MapData = self
            .iter()
            .map(|(key, value)| (key.to_value(), value.to_value()))
            .collect();
        Value::Map {
            ty: Self::static_type(),
            data: Some(Shared::new(entries)),
        }
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        match value {
            Value::Map { data: Some(data), .. } => {
                let entries = data.read();
                let mut out = HashMap::with_capacity_and_hasher(entries.len(), S::default());
                for (key, value) in entries.iter() {
                    out.insert(K::from_value(key.clone())?, V::from_value(value.clone())?);
                }
                Ok(out)
            }
            Value::Map { data: None, .. } => Ok(HashMap::default()),
            other => Err(ReflectError::mismatch(Self::static_type().name().to_string(), &other)),
        }
    }
}
