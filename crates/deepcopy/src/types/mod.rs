//! Type descriptors.
//!
//! Every value the engine copies has a `Ty`: a 32-bit handle into the
//! process-wide [`TypePool`]. Handles are `Copy`, compare in O(1), and are
//! the keys of every analysis cache in the crate.
//!
//! # Layout
//!
//! - Built-in scalars and the empty interface have fixed indices (0-7).
//! - Structural types (pointers, slices, maps, arrays, channels, functions,
//!   interfaces, opaque handles) are interned: the same shape always yields
//!   the same handle.
//! - Records are nominal. [`StructBuilder`] declares a record before its
//!   fields exist so a record can reach itself through indirection.

mod builder;
mod pool;

use std::fmt;
use std::sync::Arc;

pub use builder::StructBuilder;
pub use pool::{types, TypePool};

/// Handle to a type in the [`TypePool`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ty(u32);

impl Ty {
    // === Built-ins (indices 0-7) ===
    // Pre-registered at pool creation, in this order.

    /// Boolean.
    pub const BOOL: Self = Self(0);
    /// Signed integer (every signed width maps here).
    pub const INT: Self = Self(1);
    /// Unsigned integer (every unsigned width maps here).
    pub const UINT: Self = Self(2);
    /// 64-bit float.
    pub const FLOAT: Self = Self(3);
    /// Complex number with `f64` parts.
    pub const COMPLEX: Self = Self(4);
    /// Immutable string.
    pub const STR: Self = Self(5);
    /// A fixed point in time.
    pub const TIMESTAMP: Self = Self(6);
    /// The empty dynamic interface (`any`).
    pub const ANY: Self = Self(7);

    /// Number of pre-registered built-in types.
    pub const BUILTIN_COUNT: u32 = 8;

    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is one of the pre-registered built-ins.
    #[inline]
    pub const fn is_builtin(self) -> bool {
        self.0 < Self::BUILTIN_COUNT
    }

    /// `*elem`
    pub fn pointer_to(elem: Ty) -> Ty {
        types().pointer_to(elem)
    }

    /// `[]elem`
    pub fn slice_of(elem: Ty) -> Ty {
        types().slice_of(elem)
    }

    /// `map[key]value`
    pub fn map_of(key: Ty, value: Ty) -> Ty {
        types().map_of(key, value)
    }

    /// `[len]elem`
    pub fn array_of(elem: Ty, len: usize) -> Ty {
        types().array_of(elem, len)
    }

    /// `chan elem`
    pub fn chan_of(elem: Ty) -> Ty {
        types().chan_of(elem)
    }

    /// A function type, identified by its signature text.
    pub fn func(signature: &str) -> Ty {
        types().func(signature)
    }

    /// A named dynamic interface. `Ty::interface("any")` is [`Ty::ANY`].
    pub fn interface(name: &str) -> Ty {
        types().interface(name)
    }

    /// A handle type the engine cannot look inside.
    pub fn opaque(name: &str) -> Ty {
        types().opaque(name)
    }

    /// Shape of this type.
    pub fn kind(self) -> Kind {
        types().kind(self)
    }

    /// Discriminant of this type's shape.
    pub fn tag(self) -> Tag {
        types().tag(self)
    }

    /// Fields of a record, in declaration order. Empty for anything else.
    pub fn struct_fields(self) -> Arc<[Field]> {
        types().struct_fields(self)
    }

    /// Diagnostic name (`*Node`, `[]int`, `map[str]int`, ...).
    pub fn name(self) -> Arc<str> {
        types().name(self)
    }

    /// Name of a built-in, without touching the pool.
    pub const fn builtin_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("bool"),
            1 => Some("int"),
            2 => Some("uint"),
            3 => Some("float"),
            4 => Some("complex"),
            5 => Some("str"),
            6 => Some("timestamp"),
            7 => Some("any"),
            _ => None,
        }
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin_name() {
            Some(name) => write!(f, "Ty::{}", name.to_ascii_uppercase()),
            None => write!(f, "Ty({})", self.0),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Shape discriminant, without payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tag {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Str,
    Timestamp,
    Array,
    Struct,
    Pointer,
    Slice,
    Map,
    Chan,
    Func,
    Interface,
    Opaque,
}

impl Tag {
    /// Scalars are copied by value and never hold substructure.
    #[inline]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Tag::Bool
                | Tag::Int
                | Tag::Uint
                | Tag::Float
                | Tag::Complex
                | Tag::Str
                | Tag::Timestamp
        )
    }
}

/// Shape of a type.
#[derive(Clone, Debug)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    Str,
    Timestamp,
    /// Fixed-length inline array.
    Array { elem: Ty, len: usize },
    /// Record with fields in declaration order. Empty until defined.
    Struct { fields: Arc<[Field]> },
    Pointer(Ty),
    Slice(Ty),
    Map { key: Ty, value: Ty },
    Chan(Ty),
    Func,
    Interface,
    /// Anything the engine must not look inside.
    Opaque,
}

impl Kind {
    pub fn tag(&self) -> Tag {
        match self {
            Kind::Bool => Tag::Bool,
            Kind::Int => Tag::Int,
            Kind::Uint => Tag::Uint,
            Kind::Float => Tag::Float,
            Kind::Complex => Tag::Complex,
            Kind::Str => Tag::Str,
            Kind::Timestamp => Tag::Timestamp,
            Kind::Array { .. } => Tag::Array,
            Kind::Struct { .. } => Tag::Struct,
            Kind::Pointer(_) => Tag::Pointer,
            Kind::Slice(_) => Tag::Slice,
            Kind::Map { .. } => Tag::Map,
            Kind::Chan(_) => Tag::Chan,
            Kind::Func => Tag::Func,
            Kind::Interface => Tag::Interface,
            Kind::Opaque => Tag::Opaque,
        }
    }
}

/// Whether a record field is visible outside its declaring module.
///
/// Only exported fields are analyzed and copied. Private fields are left at
/// their zero value in every copy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Visibility {
    Exported,
    Private,
}

/// A record field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: Arc<str>,
    pub ty: Ty,
    pub visibility: Visibility,
}

impl Field {
    pub fn exported(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        Field {
            name: name.into(),
            ty,
            visibility: Visibility::Exported,
        }
    }

    pub fn private(name: impl Into<Arc<str>>, ty: Ty) -> Self {
        Field {
            name: name.into(),
            ty,
            visibility: Visibility::Private,
        }
    }

    #[inline]
    pub fn is_exported(&self) -> bool {
        self.visibility == Visibility::Exported
    }
}
