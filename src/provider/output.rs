//! Values flowing into and out of providers.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::key::TypeDescriptor;
use crate::lifecycle::Hooks;
use crate::traits::Injectable;

/// Type-erased stored value. Always holds an `Arc<T>` for the slot's type.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// A value produced by a provider (or registered directly), ready to be
/// stored under the address of its descriptor.
pub struct Produced {
    pub(crate) descriptor: TypeDescriptor,
    pub(crate) value: AnyArc,
    pub(crate) hooks: Option<Hooks>,
}

impl Produced {
    /// Wraps a value, probing its service shape while the type is still known.
    pub fn new<T: Injectable>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Wraps an already shared value.
    pub fn shared<T: ?Sized + Injectable>(value: Arc<T>) -> Self {
        let hooks = Hooks::probe(&value);
        Self {
            descriptor: T::descriptor(),
            value: Arc::new(value),
            hooks,
        }
    }

    /// Descriptor of the produced value.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Whether the value has a recognized service shape.
    pub fn is_service(&self) -> bool {
        self.hooks.is_some()
    }
}

impl std::fmt::Debug for Produced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Produced")
            .field("type", &self.descriptor.type_name())
            .field("service", &self.hooks.as_ref().map(Hooks::shape))
            .finish()
    }
}

/// A constructor parameter resolved from storage.
///
/// Implemented for `Arc<T>`; the parameter occupies `T`'s slot.
pub trait Param: Sized + Send + 'static {
    /// Descriptor used to derive the parameter's address.
    fn descriptor() -> TypeDescriptor;

    /// Downcasts a stored value to the parameter type.
    fn extract(value: &AnyArc) -> Option<Self>;
}

impl<T: ?Sized + Injectable> Param for Arc<T> {
    fn descriptor() -> TypeDescriptor {
        <Arc<T> as Injectable>::descriptor()
    }

    fn extract(value: &AnyArc) -> Option<Self> {
        if let Some(direct) = value.downcast_ref::<Arc<T>>() {
            return Some(Arc::clone(direct));
        }
        // the slot was filled with an `Arc<T>` value
        value
            .downcast_ref::<Arc<Arc<T>>>()
            .map(|nested| Arc::clone(&**nested))
    }
}

/// Marker: a single injectable output.
pub struct Single;
/// Marker: no output.
pub struct Unit;
/// Marker: a tuple of injectable outputs.
pub struct Many;
/// Marker: outputs behind a `Result` error channel.
pub struct Fallible<M>(PhantomData<M>);

/// What a constructor may return.
///
/// The marker `M` only disambiguates the implementations: a single
/// [`Injectable`], `()`, tuples of up to four injectables, or any of these
/// inside a `Result` whose error converts into [`anyhow::Error`].
pub trait IntoOutputs<M>: 'static {
    /// Descriptors of the non-error outputs.
    fn descriptors() -> Vec<TypeDescriptor>;

    /// Splits the return value into stored values, or the returned error.
    fn into_outputs(self) -> anyhow::Result<Vec<Produced>>;
}

impl<T: Injectable> IntoOutputs<Single> for T {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![T::descriptor()]
    }

    fn into_outputs(self) -> anyhow::Result<Vec<Produced>> {
        Ok(vec![Produced::new(self)])
    }
}

impl IntoOutputs<Unit> for () {
    fn descriptors() -> Vec<TypeDescriptor> {
        Vec::new()
    }

    fn into_outputs(self) -> anyhow::Result<Vec<Produced>> {
        Ok(Vec::new())
    }
}

macro_rules! impl_tuple_outputs {
    ($($T:ident),+) => {
        impl<$($T: Injectable),+> IntoOutputs<Many> for ($($T,)+) {
            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$($T::descriptor()),+]
            }

            #[allow(non_snake_case)]
            fn into_outputs(self) -> anyhow::Result<Vec<Produced>> {
                let ($($T,)+) = self;
                Ok(vec![$(Produced::new($T)),+])
            }
        }
    };
}

impl_tuple_outputs!(A, B);
impl_tuple_outputs!(A, B, C);
impl_tuple_outputs!(A, B, C, D);

impl<T, E, M> IntoOutputs<Fallible<M>> for Result<T, E>
where
    T: IntoOutputs<M>,
    E: Into<anyhow::Error> + 'static,
    M: 'static,
{
    fn descriptors() -> Vec<TypeDescriptor> {
        T::descriptors()
    }

    fn into_outputs(self) -> anyhow::Result<Vec<Produced>> {
        match self {
            Ok(outputs) => outputs.into_outputs(),
            Err(err) => Err(err.into()),
        }
    }
}
