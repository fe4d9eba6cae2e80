//! What can be registered: plain values, constructors and composite templates.
//!
//! Each kind is wrapped into an [`Item`] by one of the helper functions
//! re-exported at the crate root ([`value`], [`shared`], [`constructor`],
//! [`template`]) and handed to [`Container::register`](crate::Container::register).
//!
//! ```
//! use bootkit::{constructor, value, Container};
//! use std::sync::Arc;
//!
//! struct Settings {
//!     url: String,
//! }
//! struct Pool {
//!     url: String,
//! }
//! bootkit::injectable!(Settings, Pool);
//!
//! let container = Container::new();
//! container
//!     .register([
//!         value(Settings { url: "postgres://localhost".to_string() }),
//!         constructor(|s: Arc<Settings>| Pool { url: s.url.clone() }),
//!     ])
//!     .unwrap();
//! container.start().unwrap();
//! assert_eq!(container.resolve::<Pool>().unwrap().url, "postgres://localhost");
//! ```

use std::fmt;
use std::sync::Arc;

pub mod constructor;
pub mod output;
pub mod template;

pub use constructor::{CallError, Constructor};
pub use output::{AnyArc, Fallible, IntoOutputs, Many, Param, Produced, Single, Unit};
pub use template::{field, Composite, Field, FieldValues};

pub(crate) use constructor::ConstructorHandle;
pub(crate) use template::TemplateHandle;

use crate::traits::Injectable;

/// Something to register.
pub struct Item {
    pub(crate) kind: ItemKind,
}

pub(crate) enum ItemKind {
    Value(Produced),
    Constructor(Arc<ConstructorHandle>),
    Template(Arc<TemplateHandle>),
}

impl Item {
    /// Type name (for values and templates) or signature (for constructors).
    pub fn describe(&self) -> &str {
        match &self.kind {
            ItemKind::Value(produced) => produced.descriptor.type_name(),
            ItemKind::Constructor(handle) => handle.signature(),
            ItemKind::Template(handle) => handle.descriptor().type_name(),
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ItemKind::Value(_) => "value",
            ItemKind::Constructor(_) => "constructor",
            ItemKind::Template(_) => "template",
        };
        f.debug_struct("Item")
            .field("kind", &kind)
            .field("describe", &self.describe())
            .finish()
    }
}

/// Registers a concrete value under its type's address.
pub fn value<T: Injectable>(value: T) -> Item {
    Item {
        kind: ItemKind::Value(Produced::new(value)),
    }
}

/// Registers an already shared value, including trait objects.
///
/// ```
/// use bootkit::{shared, Container, Injectable};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// impl Injectable for dyn Clock {}
///
/// struct Fixed;
/// impl Clock for Fixed {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
///
/// let clock: Arc<dyn Clock> = Arc::new(Fixed);
/// let container = Container::new();
/// container.register([shared(clock)]).unwrap();
/// container.start().unwrap();
/// container
///     .invoke(|clock: Arc<dyn Clock>| assert_eq!(clock.now(), 42))
///     .unwrap();
/// ```
pub fn shared<T: ?Sized + Injectable>(value: Arc<T>) -> Item {
    Item {
        kind: ItemKind::Value(Produced::shared(value)),
    }
}

/// Registers a constructor. Its outputs are produced during start, once all
/// of its parameters are resolved.
pub fn constructor<F, Args, M>(f: F) -> Item
where
    F: Constructor<Args, M>,
{
    Item {
        kind: ItemKind::Constructor(Arc::new(ConstructorHandle::new(f))),
    }
}

/// Registers a [`Composite`] template for `T`.
pub fn template<T: Composite>() -> Item {
    Item {
        kind: ItemKind::Template(Arc::new(TemplateHandle::new::<T>())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Port(u16);
    impl Injectable for Port {}

    #[test]
    fn items_describe_what_they_hold() {
        assert!(value(Port(1)).describe().ends_with("Port"));
        let ctor = constructor(|p: Arc<Port>| p.0 as u32);
        assert!(ctor.describe().starts_with("fn("));
        assert!(ctor.describe().ends_with("-> u32"));
    }
}
