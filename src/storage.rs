//! Object storage: the address → entry map behind the container.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{DiError, DiResult};
use crate::key::{derive_address, Address, TypeDescriptor};
use crate::lifecycle::{Hooks, Kind, Relation, ServiceState};
use crate::provider::{AnyArc, ConstructorHandle, Item, ItemKind, Produced, TemplateHandle};

/// What an entry holds.
#[derive(Clone)]
pub(crate) enum Payload {
    Value(AnyArc),
    Constructor(Arc<ConstructorHandle>),
    Template(Arc<TemplateHandle>),
}

/// One dependency slot.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) address: Address,
    pub(crate) relation: Relation,
    pub(crate) kind: Kind,
    pub(crate) payload: Payload,
    pub(crate) service: ServiceState,
    pub(crate) hooks: Option<Hooks>,
    pub(crate) type_name: &'static str,
    /// Plain values registered for a slot that already held one.
    pub(crate) shadowed: usize,
}

impl Entry {
    fn resolved(address: Address, produced: Produced) -> Self {
        let service = match produced.hooks {
            Some(_) => ServiceState::PendingUp,
            None => ServiceState::NotAService,
        };
        Self {
            address,
            relation: Relation::ResolvedValue,
            kind: Kind::Other,
            type_name: produced.descriptor.type_name(),
            payload: Payload::Value(produced.value),
            service,
            hooks: produced.hooks,
            shadowed: 0,
        }
    }

    fn provider(address: Address, kind: Kind, payload: Payload, type_name: &'static str) -> Self {
        Self {
            address,
            relation: Relation::NewlyRegistered,
            kind,
            payload,
            service: ServiceState::NotAService,
            hooks: None,
            type_name,
            shadowed: 0,
        }
    }

    /// The stored value, once the entry holds one.
    pub(crate) fn value(&self) -> Option<&AnyArc> {
        match (&self.payload, self.relation) {
            (Payload::Value(value), Relation::ResolvedValue) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("address", &self.address)
            .field("relation", &self.relation)
            .field("kind", &self.kind)
            .field("service", &self.service)
            .field("type_name", &self.type_name)
            .field("shadowed", &self.shadowed)
            .finish()
    }
}

/// Concurrent map of every registered and produced dependency.
///
/// Writers are exclusive with each other and with iteration; lookups may run
/// concurrently.
#[derive(Default)]
pub(crate) struct ObjectStorage {
    entries: RwLock<HashMap<Address, Entry>>,
}

impl ObjectStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a registered item. Returns the address it was stored under, or
    /// `None` when its type is not a real dependency.
    pub(crate) fn add(&self, item: Item) -> DiResult<Option<Address>> {
        match item.kind {
            ItemKind::Value(produced) => self.register_value(produced),
            ItemKind::Constructor(handle) => {
                let address = handle.address();
                let entry = Entry::provider(
                    address.clone(),
                    Kind::Callable,
                    Payload::Constructor(handle),
                    std::any::type_name::<ConstructorHandle>(),
                );
                self.insert(entry)?;
                Ok(Some(address))
            }
            ItemKind::Template(handle) => {
                let (address, is_dependency) = handle.address();
                if !is_dependency {
                    return Ok(None);
                }
                let type_name = handle.descriptor().type_name();
                let entry = Entry::provider(
                    address.clone(),
                    Kind::Composite,
                    Payload::Template(handle),
                    type_name,
                );
                self.insert(entry)?;
                Ok(Some(address))
            }
        }
    }

    /// Stores a registered plain value as resolved. A second plain value for
    /// an already resolved slot is not stored; it is counted against the
    /// slot, and the next start fails on it with `AlreadyInitiated`.
    fn register_value(&self, produced: Produced) -> DiResult<Option<Address>> {
        let (address, is_dependency) = derive_address(&produced.descriptor, None);
        if !is_dependency {
            return Ok(None);
        }
        let mut entries = self.entries.write();
        match entries.get_mut(&address) {
            Some(existing) if existing.relation == Relation::ResolvedValue => {
                existing.shadowed += 1;
                tracing::debug!(address = %address, shadowed = existing.shadowed, "duplicate value registered");
            }
            _ => {
                entries.insert(address.clone(), Entry::resolved(address.clone(), produced));
            }
        }
        Ok(Some(address))
    }

    /// Stores a produced value as resolved. Error-like and anonymous values
    /// are accepted and dropped.
    pub(crate) fn add_value(&self, produced: Produced) -> DiResult<Option<Address>> {
        let (address, is_dependency) = derive_address(&produced.descriptor, None);
        if !is_dependency {
            return Ok(None);
        }
        self.insert(Entry::resolved(address.clone(), produced))?;
        Ok(Some(address))
    }

    fn insert(&self, entry: Entry) -> DiResult<()> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&entry.address) {
            if existing.relation == Relation::ResolvedValue {
                return Err(DiError::AlreadyInitiated(entry.address));
            }
        }
        entries.insert(entry.address.clone(), entry);
        Ok(())
    }

    pub(crate) fn get(&self, address: &Address) -> DiResult<Entry> {
        self.entries
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| DiError::NotInitiated(address.clone()))
    }

    /// Looks up the resolved value a parameter of type `descriptor` would receive.
    pub(crate) fn lookup(&self, descriptor: &TypeDescriptor) -> DiResult<(Address, AnyArc)> {
        let (address, is_dependency) = derive_address(descriptor, None);
        if !is_dependency {
            return Err(DiError::Unsupported {
                type_name: descriptor.type_name(),
            });
        }
        let entry = self.get(&address)?;
        match entry.value() {
            Some(value) => Ok((address, Arc::clone(value))),
            None => Err(DiError::NotInitiated(address)),
        }
    }

    /// Visits every entry under the read lock, stopping at the first error.
    /// The visitor must not call back into storage.
    pub(crate) fn each<F>(&self, mut visit: F) -> DiResult<()>
    where
        F: FnMut(&Entry) -> DiResult<()>,
    {
        let entries = self.entries.read();
        for entry in entries.values() {
            visit(entry)?;
        }
        Ok(())
    }

    pub(crate) fn mark_resolved(&self, address: &Address) {
        if let Some(entry) = self.entries.write().get_mut(address) {
            entry.relation = Relation::ResolvedValue;
        }
    }

    pub(crate) fn set_service(&self, address: &Address, state: ServiceState) {
        if let Some(entry) = self.entries.write().get_mut(address) {
            entry.service = state;
        }
    }

    /// Returns every running service to `PendingUp` so a later start runs
    /// its `up` hook again.
    pub(crate) fn reset_running(&self) -> usize {
        let mut entries = self.entries.write();
        let mut reset = 0;
        for entry in entries.values_mut() {
            if entry.service == ServiceState::RunningUp {
                entry.service = ServiceState::PendingUp;
                reset += 1;
            }
        }
        reset
    }

    /// All entries ordered by address.
    pub(crate) fn snapshot(&self) -> Vec<Entry> {
        let mut entries: Vec<Entry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.address.cmp(&b.address));
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}
