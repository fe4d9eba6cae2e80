//! Dependency addresses and the type descriptors they are derived from.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Address reserved for error-like types. Never stored.
pub const ERROR_ADDRESS: &str = "error";

/// Canonical string identifying a dependency slot.
///
/// Two requests for the same dependency always derive the same address, and
/// the container stores at most one entry per address.
///
/// # Examples
///
/// ```rust
/// use bootkit::{derive_address, Injectable, TypeDescriptor};
///
/// struct Database;
/// bootkit::injectable!(Database);
///
/// let (address, is_dependency) = derive_address(&Database::descriptor(), None);
/// assert!(is_dependency);
/// assert!(address.as_str().ends_with(".Database"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub struct Address(String);

impl Address {
    /// Wraps an already-canonical address string.
    pub fn new(address: impl Into<String>) -> Self {
        Address(address.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Value-identity token of a registered callable.
///
/// Closures all render as `{{closure}}` and function items can share a
/// signature, so each constructor gets a process-unique serial number when it
/// is wrapped for registration. Two structurally identical constructors
/// registered separately therefore occupy distinct slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(u64);

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

impl Identity {
    /// Allocates the next identity.
    pub fn next() -> Self {
        Identity(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw serial number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Structural classification of a type, as far as addressing is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A type declared with a name in some module
    Named,
    /// An error-like type; a control signal, never a dependency
    Error,
    /// A pointer, slice or array over an element type
    Element(Box<TypeDescriptor>),
    /// A callable with the given structural signature
    Callable(String),
    /// Anything else (tuples, unit, opaque types)
    Anonymous,
}

/// Runtime descriptor of a type, emitted statically by [`crate::Injectable`].
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    shape: Shape,
}

impl TypeDescriptor {
    fn with_shape<T: ?Sized + 'static>(shape: Shape) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            shape,
        }
    }

    /// Descriptor of a named type.
    pub fn named<T: ?Sized + 'static>() -> Self {
        Self::with_shape::<T>(Shape::Named)
    }

    /// Descriptor of an error-like type.
    pub fn error<T: ?Sized + 'static>() -> Self {
        Self::with_shape::<T>(Shape::Error)
    }

    /// Descriptor of a pointer-like container over `element`.
    pub fn element<T: ?Sized + 'static>(element: TypeDescriptor) -> Self {
        Self::with_shape::<T>(Shape::Element(Box::new(element)))
    }

    /// Descriptor of a callable with a structural signature.
    pub fn callable<T: ?Sized + 'static>(signature: impl Into<String>) -> Self {
        Self::with_shape::<T>(Shape::Callable(signature.into()))
    }

    /// Descriptor of a type that cannot be addressed.
    pub fn anonymous<T: ?Sized + 'static>() -> Self {
        Self::with_shape::<T>(Shape::Anonymous)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this descriptor is error-like.
    pub fn is_error(&self) -> bool {
        self.shape == Shape::Error
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.shape == other.shape
    }
}

impl Eq for TypeDescriptor {}

/// Converts a descriptor (optionally bound to a value identity) into its
/// canonical address.
///
/// The boolean is `false` when the type cannot be provided by registration:
/// error-like types, anonymous types, and callables probed without a value.
///
/// # Examples
///
/// ```rust
/// use bootkit::{derive_address, Identity, TypeDescriptor, ERROR_ADDRESS};
///
/// let (address, ok) = derive_address(&TypeDescriptor::error::<std::io::Error>(), None);
/// assert_eq!(address.as_str(), ERROR_ADDRESS);
/// assert!(!ok);
///
/// let probe = TypeDescriptor::callable::<fn(u8)>("fn(u8)");
/// assert_eq!(derive_address(&probe, None).0.as_str(), "fn(u8)");
/// assert!(derive_address(&probe, Some(Identity::next())).1);
/// ```
pub fn derive_address(descriptor: &TypeDescriptor, identity: Option<Identity>) -> (Address, bool) {
    match descriptor.shape() {
        Shape::Error => (Address::new(ERROR_ADDRESS), false),
        Shape::Named => (Address::new(named_address(descriptor.type_name())), true),
        Shape::Element(element) => match element.shape() {
            Shape::Named | Shape::Element(_) => derive_address(element, None),
            _ => (Address::new(descriptor.type_name()), false),
        },
        Shape::Callable(signature) => match identity {
            Some(identity) => (Address::new(format!("{}#{}", signature, identity.get())), true),
            None => (Address::new(signature.clone()), false),
        },
        Shape::Anonymous => (Address::new(descriptor.type_name()), false),
    }
}

/// `scope.name` for a declared type name such as `app::db::Pool<app::Pg>`.
///
/// Trait objects are addressed by the trait path alone, and a type without a
/// module path (primitives) is addressed by its bare name.
fn named_address(type_name: &str) -> String {
    let path = match type_name.strip_prefix("dyn ") {
        Some(bounds) => first_bound(bounds),
        None => type_name,
    };

    match last_separator(path) {
        Some(at) => format!("{}.{}", &path[..at], &path[at + 2..]),
        None => path.to_string(),
    }
}

/// First `+`-separated bound outside generic arguments.
fn first_bound(bounds: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in bounds.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => return bounds[..i].trim_end(),
            _ => {}
        }
    }
    bounds
}

/// Byte offset of the last `::` outside generic arguments.
fn last_separator(path: &str) -> Option<usize> {
    let bytes = path.as_bytes();
    let mut depth = 0usize;
    let mut found = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' | b'(' | b'[' => depth += 1,
            b'>' | b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                found = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    found
}

/// Structural signature of a callable, e.g. `fn(app::A, u8) -> app::B`.
pub(crate) fn signature(params: &[TypeDescriptor], outputs: &[TypeDescriptor]) -> String {
    let params: Vec<&str> = params.iter().map(|d| d.type_name()).collect();
    let mut sig = format!("fn({})", params.join(", "));
    match outputs.len() {
        0 => {}
        1 => {
            sig.push_str(" -> ");
            sig.push_str(outputs[0].type_name());
        }
        _ => {
            let outputs: Vec<&str> = outputs.iter().map(|d| d.type_name()).collect();
            sig.push_str(&format!(" -> ({})", outputs.join(", ")));
        }
    }
    sig
}
