//! Walks a topological order, running providers and starting services.

use crate::error::{DiError, DiResult};
use crate::internal::ServiceHistory;
use crate::key::{derive_address, Address};
use crate::lifecycle::{Hooks, Relation, ServiceState, UpArgs};
use crate::provider::{AnyArc, CallError, ConstructorHandle, FieldValues, Produced, TemplateHandle};
use crate::storage::{Entry, ObjectStorage, Payload};

pub(crate) struct Executor<'a> {
    storage: &'a ObjectStorage,
    history: &'a ServiceHistory,
    args: UpArgs<'a>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(storage: &'a ObjectStorage, history: &'a ServiceHistory, args: UpArgs<'a>) -> Self {
        Self {
            storage,
            history,
            args,
        }
    }

    /// Processes every address in order. Addresses with no entry (parameters
    /// nobody registered, untracked outputs) are skipped; whoever needs them
    /// fails on lookup.
    pub(crate) fn run(&self, order: &[Address]) -> DiResult<()> {
        for address in order {
            let entry = match self.storage.get(address) {
                Ok(entry) => entry,
                Err(_) => {
                    tracing::trace!(address = %address, "no entry, skipping");
                    continue;
                }
            };
            self.step(entry)?;
        }
        self.history.rewind_to_latest();
        Ok(())
    }

    fn step(&self, entry: Entry) -> DiResult<()> {
        if entry.shadowed > 0 {
            return Err(DiError::AlreadyInitiated(entry.address));
        }
        if entry.relation == Relation::ResolvedValue {
            if entry.service == ServiceState::PendingUp {
                self.start_entry(&entry)?;
            }
            return Ok(());
        }

        match &entry.payload {
            Payload::Constructor(handle) => self.run_constructor(&entry.address, handle),
            Payload::Template(handle) => self.run_template(&entry.address, handle),
            // values are stored resolved
            Payload::Value(_) => Ok(()),
        }
    }

    fn run_constructor(&self, address: &Address, handle: &ConstructorHandle) -> DiResult<()> {
        let outputs = self.call(address, handle)?;
        self.storage.mark_resolved(address);
        tracing::debug!(
            constructor = %address,
            outputs = outputs.len(),
            "constructor resolved"
        );
        for produced in outputs {
            self.absorb(produced)?;
        }
        Ok(())
    }

    fn run_template(&self, address: &Address, handle: &TemplateHandle) -> DiResult<()> {
        let mut values = FieldValues::new(address.clone());
        for field in handle.fields() {
            let (field_address, value) = self.storage.lookup(field.descriptor())?;
            values.insert(field.name(), field_address, value);
        }
        let produced = handle.assemble(&mut values).map_err(|err| match err {
            DiError::MissingField { .. } => err,
            other => DiError::Assemble {
                address: address.clone(),
                source: Box::new(other),
            },
        })?;
        tracing::debug!(template = %address, fields = handle.fields().len(), "template assembled");
        self.absorb(produced)
    }

    /// Resolves the constructor's parameters and calls it.
    pub(crate) fn call(&self, address: &Address, handle: &ConstructorHandle) -> DiResult<Vec<Produced>> {
        let args = handle
            .params()
            .iter()
            .map(|param| self.storage.lookup(param).map(|(_, value)| value))
            .collect::<DiResult<Vec<AnyArc>>>()?;

        handle.call(&args).map_err(|err| match err {
            CallError::Argument { index, type_name } => DiError::TypeMismatch {
                address: handle
                    .params()
                    .get(index)
                    .map(|param| derive_address(param, None).0)
                    .unwrap_or_else(|| address.clone()),
                type_name,
            },
            CallError::Returned(source) => DiError::Constructor {
                address: address.clone(),
                source,
            },
        })
    }

    /// Stores a produced value and starts it if it is a service.
    /// Untracked outputs are accepted and dropped.
    fn absorb(&self, produced: Produced) -> DiResult<()> {
        let hooks = produced.hooks.clone();
        let type_name = produced.descriptor.type_name();
        let address = match self.storage.add_value(produced)? {
            Some(address) => address,
            None => {
                tracing::debug!(type_name, "untracked output");
                return Ok(());
            }
        };

        tracing::debug!(address = %address, service = hooks.is_some(), "value resolved");
        match hooks {
            Some(hooks) => self.start_service(&address, hooks),
            None => Ok(()),
        }
    }

    fn start_entry(&self, entry: &Entry) -> DiResult<()> {
        let hooks = entry
            .hooks
            .clone()
            .ok_or_else(|| DiError::UnknownServiceShape(entry.address.to_string()))?;
        self.start_service(&entry.address, hooks)
    }

    // A slot is `RunningUp` only once its `up` hook succeeded.
    fn start_service(&self, address: &Address, hooks: Hooks) -> DiResult<()> {
        self.history.record_and_start(address.as_str(), hooks, &self.args)?;
        self.storage.set_service(address, ServiceState::RunningUp);
        Ok(())
    }

    /// Starts and records service outputs of an ad-hoc call without storing
    /// them.
    pub(crate) fn start_outputs(&self, outputs: Vec<Produced>) -> DiResult<()> {
        for produced in outputs {
            if let Some(hooks) = produced.hooks {
                let (address, _) = derive_address(&produced.descriptor, None);
                self.history.record_and_start(address.as_str(), hooks, &self.args)?;
            }
        }
        Ok(())
    }
}
