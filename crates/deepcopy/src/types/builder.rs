//! Record declarations.

use std::sync::Arc;

use super::{types, Field, Ty};
use crate::error::TypeError;
use crate::hooks::CopyHook;

/// Declares a record type in the pool.
///
/// The handle exists as soon as the builder does, so fields may refer to
/// the record being declared:
///
/// ```
/// use deepcopy::{StructBuilder, Ty};
///
/// let builder = StructBuilder::new("Node");
/// let node = builder.ty();
/// let node = builder
///     .field("Name", Ty::STR)
///     .field("Next", Ty::pointer_to(node))
///     .build()
///     .unwrap();
/// assert_eq!(&*node.name(), "Node");
/// ```
pub struct StructBuilder {
    ty: Ty,
    fields: Vec<Field>,
    hook: Option<CopyHook>,
}

impl StructBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        StructBuilder {
            ty: types().declare_struct(name.into()),
            fields: Vec::new(),
            hook: None,
        }
    }

    /// Handle of the record under construction.
    pub fn ty(&self) -> Ty {
        self.ty
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<Arc<str>>, ty: Ty) -> Self {
        self.fields.push(Field::exported(name, ty));
        self
    }

    #[must_use]
    pub fn private_field(mut self, name: impl Into<Arc<str>>, ty: Ty) -> Self {
        self.fields.push(Field::private(name, ty));
        self
    }

    /// Attach the record's own copy operation.
    #[must_use]
    pub fn copy_hook(mut self, hook: CopyHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build(self) -> Result<Ty, TypeError> {
        types().define_struct(self.ty, self.fields, self.hook)?;
        Ok(self.ty)
    }
}
