//! Process-wide type pool.
//!
//! One `RwLock` guards the entry table and the shape interner. Reads (the
//! overwhelmingly common case once a program's types are registered) take
//! the shared lock; interning a new shape double-checks under the exclusive
//! lock, following the same fast-path/slow-path split as the type interner.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Field, Kind, Tag, Ty};
use crate::error::TypeError;
use crate::hooks::CopyHook;

/// Interning key for structural types.
#[derive(Clone, Eq, PartialEq, Hash)]
enum ShapeKey {
    Array(Ty, usize),
    Pointer(Ty),
    Slice(Ty),
    Map(Ty, Ty),
    Chan(Ty),
    Func(Arc<str>),
    Interface(Arc<str>),
    Opaque(Arc<str>),
}

struct TypeEntry {
    kind: Kind,
    name: Arc<str>,
    hook: Option<CopyHook>,
    /// Records start undefined; everything else is defined on creation.
    defined: bool,
}

impl TypeEntry {
    fn new(kind: Kind, name: Arc<str>) -> Self {
        TypeEntry {
            kind,
            name,
            hook: None,
            defined: true,
        }
    }
}

struct PoolInner {
    entries: Vec<TypeEntry>,
    interned: FxHashMap<ShapeKey, Ty>,
}

impl PoolInner {
    fn push(&mut self, entry: TypeEntry) -> Ty {
        let raw = u32::try_from(self.entries.len())
            .unwrap_or_else(|_| panic!("type pool exhausted the 32-bit handle space"));
        self.entries.push(entry);
        Ty::from_raw(raw)
    }

    fn entry(&self, ty: Ty) -> &TypeEntry {
        &self.entries[ty.raw() as usize]
    }

    fn shape_name(&self, key: &ShapeKey) -> Arc<str> {
        let name = |ty: Ty| self.entry(ty).name.clone();
        match key {
            ShapeKey::Array(elem, len) => format!("[{len}]{}", name(*elem)).into(),
            ShapeKey::Pointer(elem) => format!("*{}", name(*elem)).into(),
            ShapeKey::Slice(elem) => format!("[]{}", name(*elem)).into(),
            ShapeKey::Map(key, value) => format!("map[{}]{}", name(*key), name(*value)).into(),
            ShapeKey::Chan(elem) => format!("chan {}", name(*elem)).into(),
            ShapeKey::Func(sig) | ShapeKey::Interface(sig) | ShapeKey::Opaque(sig) => sig.clone(),
        }
    }

    /// Whether `from` holds a `target` inline, without any indirection.
    fn contains_inline(&self, from: Ty, target: Ty, seen: &mut FxHashSet<Ty>) -> bool {
        if from == target {
            return true;
        }
        if !seen.insert(from) {
            return false;
        }
        match &self.entry(from).kind {
            Kind::Array { elem, .. } => self.contains_inline(*elem, target, seen),
            Kind::Struct { fields } => fields
                .iter()
                .any(|field| self.contains_inline(field.ty, target, seen)),
            _ => false,
        }
    }
}

/// Registry of every type descriptor in the process.
pub struct TypePool {
    inner: RwLock<PoolInner>,
}

static POOL: LazyLock<TypePool> = LazyLock::new(TypePool::new);

/// The process-wide type pool.
pub fn types() -> &'static TypePool {
    &POOL
}

impl TypePool {
    fn new() -> Self {
        let builtins = [
            (Kind::Bool, "bool"),
            (Kind::Int, "int"),
            (Kind::Uint, "uint"),
            (Kind::Float, "float"),
            (Kind::Complex, "complex"),
            (Kind::Str, "str"),
            (Kind::Timestamp, "timestamp"),
            (Kind::Interface, "any"),
        ];

        let mut inner = PoolInner {
            entries: Vec::with_capacity(256),
            interned: FxHashMap::default(),
        };
        for (kind, name) in builtins {
            inner.push(TypeEntry::new(kind, Arc::from(name)));
        }
        inner
            .interned
            .insert(ShapeKey::Interface(Arc::from("any")), Ty::ANY);

        TypePool {
            inner: RwLock::new(inner),
        }
    }

    fn intern(&self, key: ShapeKey) -> Ty {
        if let Some(&ty) = self.inner.read().interned.get(&key) {
            return ty;
        }

        let mut inner = self.inner.write();
        // Another thread may have interned the shape between the two locks.
        if let Some(&ty) = inner.interned.get(&key) {
            return ty;
        }

        let kind = match &key {
            ShapeKey::Array(elem, len) => Kind::Array {
                elem: *elem,
                len: *len,
            },
            ShapeKey::Pointer(elem) => Kind::Pointer(*elem),
            ShapeKey::Slice(elem) => Kind::Slice(*elem),
            ShapeKey::Map(key, value) => Kind::Map {
                key: *key,
                value: *value,
            },
            ShapeKey::Chan(elem) => Kind::Chan(*elem),
            ShapeKey::Func(_) => Kind::Func,
            ShapeKey::Interface(_) => Kind::Interface,
            ShapeKey::Opaque(_) => Kind::Opaque,
        };
        let name = inner.shape_name(&key);
        let ty = inner.push(TypeEntry::new(kind, name));
        inner.interned.insert(key, ty);
        ty
    }

    pub fn pointer_to(&self, elem: Ty) -> Ty {
        self.intern(ShapeKey::Pointer(elem))
    }

    pub fn slice_of(&self, elem: Ty) -> Ty {
        self.intern(ShapeKey::Slice(elem))
    }

    pub fn map_of(&self, key: Ty, value: Ty) -> Ty {
        self.intern(ShapeKey::Map(key, value))
    }

    pub fn array_of(&self, elem: Ty, len: usize) -> Ty {
        self.intern(ShapeKey::Array(elem, len))
    }

    pub fn chan_of(&self, elem: Ty) -> Ty {
        self.intern(ShapeKey::Chan(elem))
    }

    pub fn func(&self, signature: &str) -> Ty {
        self.intern(ShapeKey::Func(Arc::from(signature)))
    }

    pub fn interface(&self, name: &str) -> Ty {
        self.intern(ShapeKey::Interface(Arc::from(name)))
    }

    pub fn opaque(&self, name: &str) -> Ty {
        self.intern(ShapeKey::Opaque(Arc::from(name)))
    }

    /// Register a new, not yet defined record.
    pub fn declare_struct(&self, name: Arc<str>) -> Ty {
        let mut entry = TypeEntry::new(
            Kind::Struct {
                fields: Arc::<[Field]>::from(Vec::new()),
            },
            name,
        );
        entry.defined = false;
        self.inner.write().push(entry)
    }

    /// Give a declared record its fields and, optionally, a copy hook.
    pub fn define_struct(
        &self,
        ty: Ty,
        fields: Vec<Field>,
        hook: Option<CopyHook>,
    ) -> Result<(), TypeError> {
        let mut inner = self.inner.write();
        let entry = inner.entry(ty);
        let name = entry.name.clone();
        if !matches!(entry.kind, Kind::Struct { .. }) {
            return Err(TypeError::NotAStruct {
                name: name.to_string(),
            });
        }
        if entry.defined {
            return Err(TypeError::AlreadyDefined {
                name: name.to_string(),
            });
        }

        let mut names = FxHashSet::default();
        for field in &fields {
            if !names.insert(field.name.clone()) {
                return Err(TypeError::DuplicateField {
                    ty: name.to_string(),
                    field: field.name.to_string(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        if fields
            .iter()
            .any(|field| inner.contains_inline(field.ty, ty, &mut seen))
        {
            return Err(TypeError::RecursiveInline {
                name: name.to_string(),
            });
        }

        let entry = &mut inner.entries[ty.raw() as usize];
        entry.kind = Kind::Struct {
            fields: Arc::from(fields),
        };
        entry.defined = true;
        if hook.is_some() {
            entry.hook = hook;
        }
        Ok(())
    }

    /// Attach a copy hook to a non-built-in type.
    ///
    /// Analyses cached before the hook was attached are not revisited, so
    /// hooks belong next to the type's declaration.
    pub fn set_copy_hook(&self, ty: Ty, hook: CopyHook) -> Result<(), TypeError> {
        if ty.is_builtin() {
            return Err(TypeError::BuiltinHook {
                name: self.name(ty).to_string(),
            });
        }
        self.inner.write().entries[ty.raw() as usize].hook = Some(hook);
        Ok(())
    }

    /// The copy hook attached to `ty`, if any.
    pub fn copy_hook(&self, ty: Ty) -> Option<CopyHook> {
        if ty.is_builtin() {
            return None;
        }
        self.inner.read().entry(ty).hook.clone()
    }

    pub fn kind(&self, ty: Ty) -> Kind {
        self.inner.read().entry(ty).kind.clone()
    }

    pub fn tag(&self, ty: Ty) -> Tag {
        self.inner.read().entry(ty).kind.tag()
    }

    pub fn name(&self, ty: Ty) -> Arc<str> {
        if let Some(name) = ty.builtin_name() {
            return Arc::from(name);
        }
        self.inner.read().entry(ty).name.clone()
    }

    /// Fields of a record, in declaration order. Empty for anything else.
    pub fn struct_fields(&self, ty: Ty) -> Arc<[Field]> {
        match &self.inner.read().entry(ty).kind {
            Kind::Struct { fields } => fields.clone(),
            _ => Arc::<[Field]>::from(Vec::new()),
        }
    }

    /// Whether a record has received its fields.
    pub fn is_defined(&self, ty: Ty) -> bool {
        self.inner.read().entry(ty).defined
    }

    /// Number of registered types, built-ins included.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Never true: the built-ins are always present.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}
