//! Entry descriptors for introspection and diagnostics.

use crate::key::Address;
use crate::lifecycle::{Kind, Relation, ServiceState};
use crate::storage::{Entry, Payload};

/// Snapshot of one stored entry.
///
/// Descriptors are copies: they do not change when the container resolves
/// or starts the entry afterwards.
///
/// # Use Cases
///
/// - **Debugging**: see which constructors have run and which services are up
/// - **Health checks**: assert every expected service is `RunningUp` after start
/// - **Documentation**: list what an application wires together
///
/// # Examples
///
/// ```rust
/// use bootkit::{constructor, value, Container, Kind, Relation, ServiceState};
/// use std::sync::Arc;
///
/// struct Settings;
/// struct Repository;
/// bootkit::injectable!(Settings, Repository);
///
/// let container = Container::new();
/// container
///     .register([
///         value(Settings),
///         constructor(|_: Arc<Settings>| Repository),
///     ])
///     .unwrap();
///
/// let before = container.descriptors();
/// let ctor = before.iter().find(|d| d.kind == Kind::Callable).unwrap();
/// assert_eq!(ctor.relation, Relation::NewlyRegistered);
///
/// container.start().unwrap();
/// let after = container.descriptors();
/// let repo = after
///     .iter()
///     .find(|d| d.type_name.ends_with("Repository"))
///     .unwrap();
/// assert_eq!(repo.relation, Relation::ResolvedValue);
/// assert_eq!(repo.service, ServiceState::NotAService);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub struct EntryDescriptor {
    /// Address of the slot
    pub address: Address,
    /// Provider or concrete value
    pub relation: Relation,
    /// What was registered
    pub kind: Kind,
    /// Lifecycle classification
    pub service: ServiceState,
    /// Type name of the value or template, or a constructor's signature
    pub type_name: String,
}

impl EntryDescriptor {
    pub fn is_resolved(&self) -> bool {
        self.relation == Relation::ResolvedValue
    }

    pub fn is_service(&self) -> bool {
        self.service != ServiceState::NotAService
    }

    /// Whether the entry is a constructor.
    pub fn is_constructor(&self) -> bool {
        self.kind == Kind::Callable
    }

    pub(crate) fn from_entry(entry: &Entry) -> Self {
        Self {
            address: entry.address.clone(),
            relation: entry.relation,
            kind: entry.kind,
            service: entry.service,
            type_name: match &entry.payload {
                Payload::Constructor(handle) => handle.signature().to_string(),
                _ => entry.type_name.to_string(),
            },
        }
    }
}
