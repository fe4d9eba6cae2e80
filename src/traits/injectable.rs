//! The trait every dependency type implements.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cancellation::Context;
use crate::error::DiError;
use crate::key::TypeDescriptor;
#[cfg(feature = "tokio")]
use crate::traits::TokenService;
use crate::traits::{ContextService, Service};

/// A type that can occupy a dependency slot.
///
/// The container has no runtime reflection to fall back on, so each dependency
/// type states how it is addressed ([`descriptor`](Self::descriptor)) and
/// which lifecycle shape it has, if any. All methods have defaults: a plain
/// named value needs only an empty impl, or the [`injectable!`](crate::injectable)
/// macro.
///
/// The three service probes are tried in order (`as_service`,
/// `as_context_service`, `as_token_service`); the first that returns `Some`
/// supplies both the start and the stop hook.
///
/// # Examples
///
/// ```
/// use bootkit::{Context, ContextService, Injectable};
/// use std::sync::Arc;
///
/// struct Config {
///     port: u16,
/// }
/// impl Injectable for Config {}
///
/// struct Listener;
///
/// impl ContextService for Listener {
///     fn up(&self, ctx: &Context) -> anyhow::Result<()> {
///         ctx.check()?;
///         Ok(())
///     }
///
///     fn down(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// impl Injectable for Listener {
///     fn as_context_service(self: Arc<Self>) -> Option<Arc<dyn ContextService>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Runtime descriptor used to derive this type's address.
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::named::<Self>()
    }

    /// Plain start/stop shape.
    fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        None
    }

    /// Start hook taking the container's [`Context`].
    fn as_context_service(self: Arc<Self>) -> Option<Arc<dyn ContextService>> {
        None
    }

    /// Start hook taking tokio's cancellation token.
    #[cfg(feature = "tokio")]
    fn as_token_service(self: Arc<Self>) -> Option<Arc<dyn TokenService>> {
        None
    }
}

/// Implements [`Injectable`] with its defaults for one or more types.
///
/// ```
/// struct Config;
/// struct Pool;
/// bootkit::injectable!(Config, Pool);
/// ```
#[macro_export]
macro_rules! injectable {
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::Injectable for $ty {})+
    };
}

injectable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, str,
    String, std::time::Duration, std::path::PathBuf, Context
);

#[cfg(feature = "tokio")]
injectable!(tokio_util::sync::CancellationToken);

impl<T: Send + Sync + 'static> Injectable for Vec<T> {}

impl<T: Send + Sync + 'static> Injectable for Option<T> {}

impl<K, V> Injectable for HashMap<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
}

impl<K, V> Injectable for BTreeMap<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
}

// Pointers are transparent: `Arc<T>` and `&'static T` share `T`'s slot.
impl<T: ?Sized + Injectable> Injectable for Arc<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::element::<Self>(T::descriptor())
    }

    fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
        T::as_service(Arc::clone(&*self))
    }

    fn as_context_service(self: Arc<Self>) -> Option<Arc<dyn ContextService>> {
        T::as_context_service(Arc::clone(&*self))
    }

    #[cfg(feature = "tokio")]
    fn as_token_service(self: Arc<Self>) -> Option<Arc<dyn TokenService>> {
        T::as_token_service(Arc::clone(&*self))
    }
}

impl<T: ?Sized + Injectable> Injectable for &'static T {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::element::<Self>(T::descriptor())
    }
}

impl<T: Injectable, const N: usize> Injectable for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::element::<Self>(T::descriptor())
    }
}

// Errors are control signals, never dependencies.
impl Injectable for DiError {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error::<Self>()
    }
}

impl Injectable for anyhow::Error {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error::<Self>()
    }
}

impl Injectable for std::io::Error {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error::<Self>()
    }
}

impl Injectable for Box<dyn std::error::Error + Send + Sync> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::error::<Self>()
    }
}

// A parameter of callable type is a probe: it has a signature but no identity,
// so nothing registered can ever satisfy it.
macro_rules! injectable_fn_pointer {
    ($($arg:ident),*) => {
        impl<R: 'static, $($arg: 'static),*> Injectable for fn($($arg),*) -> R {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::callable::<Self>(std::any::type_name::<Self>())
            }
        }
    };
}

injectable_fn_pointer!();
injectable_fn_pointer!(A1);
injectable_fn_pointer!(A1, A2);
injectable_fn_pointer!(A1, A2, A3);
