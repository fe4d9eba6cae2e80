//! Composite templates: structs assembled field by field from resolved
//! dependencies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{derive_address, Address, TypeDescriptor};
use crate::provider::output::{AnyArc, Param, Produced};
use crate::traits::Injectable;

/// A struct whose fields are all dependencies.
///
/// Registering a template (see [`template`](crate::template)) makes the
/// struct's slot depend on every field's slot. During start, once the fields
/// are resolved, [`assemble`](Self::assemble) builds the value and it replaces
/// the template in storage.
///
/// # Examples
///
/// ```
/// use bootkit::{field, Composite, Container, DiResult, Field, FieldValues, Injectable};
/// use bootkit::{template, value};
/// use std::sync::Arc;
///
/// struct Db(&'static str);
/// struct Cache(u32);
/// bootkit::injectable!(Db, Cache);
///
/// struct Handlers {
///     db: Arc<Db>,
///     cache: Arc<Cache>,
/// }
/// impl Injectable for Handlers {}
///
/// impl Composite for Handlers {
///     fn fields() -> Vec<Field> {
///         vec![field::<Db>("db"), field::<Cache>("cache")]
///     }
///
///     fn assemble(values: &mut FieldValues) -> DiResult<Self> {
///         Ok(Handlers {
///             db: values.take("db")?,
///             cache: values.take("cache")?,
///         })
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register([value(Db("pg")), value(Cache(64)), template::<Handlers>()])
///     .unwrap();
/// container.start().unwrap();
///
/// let handlers = container.resolve::<Handlers>().unwrap();
/// assert_eq!(handlers.db.0, "pg");
/// assert_eq!(handlers.cache.0, 64);
/// ```
pub trait Composite: Injectable + Sized {
    /// Named fields and the dependency each one holds.
    fn fields() -> Vec<Field>;

    /// Builds the value from resolved fields.
    fn assemble(values: &mut FieldValues) -> DiResult<Self>;
}

/// One named field of a [`Composite`].
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    descriptor: TypeDescriptor,
}

impl Field {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

/// Declares a field holding `Arc<T>`.
pub fn field<T: ?Sized + Injectable>(name: &'static str) -> Field {
    Field {
        name,
        descriptor: <Arc<T> as Param>::descriptor(),
    }
}

/// Resolved field values handed to [`Composite::assemble`].
pub struct FieldValues {
    template: Address,
    values: HashMap<&'static str, (Address, AnyArc)>,
}

impl FieldValues {
    pub(crate) fn new(template: Address) -> Self {
        Self {
            template,
            values: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &'static str, address: Address, value: AnyArc) {
        self.values.insert(name, (address, value));
    }

    /// Takes the value of the named field.
    pub fn take<T: ?Sized + Injectable>(&mut self, name: &str) -> DiResult<Arc<T>> {
        let (address, value) = self
            .values
            .remove(name)
            .ok_or_else(|| DiError::MissingField {
                address: self.template.clone(),
                field: name.to_string(),
            })?;
        <Arc<T> as Param>::extract(&value).ok_or(DiError::TypeMismatch {
            address,
            type_name: std::any::type_name::<T>(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for FieldValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValues")
            .field("template", &self.template)
            .field("fields", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

type Assembler = Box<dyn Fn(&mut FieldValues) -> DiResult<Produced> + Send + Sync>;

/// A registered template with its struct type erased.
pub(crate) struct TemplateHandle {
    descriptor: TypeDescriptor,
    fields: Vec<Field>,
    assemble: Assembler,
}

impl TemplateHandle {
    pub(crate) fn new<T: Composite>() -> Self {
        Self {
            descriptor: T::descriptor(),
            fields: T::fields(),
            assemble: Box::new(|values: &mut FieldValues| {
                T::assemble(values).map(Produced::new)
            }),
        }
    }

    pub(crate) fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub(crate) fn address(&self) -> (Address, bool) {
        derive_address(&self.descriptor, None)
    }

    pub(crate) fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn assemble(&self, values: &mut FieldValues) -> DiResult<Produced> {
        (self.assemble)(values)
    }
}

impl fmt::Debug for TemplateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateHandle")
            .field("type", &self.descriptor.type_name())
            .field("fields", &self.fields.iter().map(Field::name).collect::<Vec<_>>())
            .finish()
    }
}
