//! Entry classifications and the service capability probe.

use std::sync::Arc;

use crate::cancellation::Context;
use crate::traits::{ContextService, Injectable, Service};
#[cfg(feature = "tokio")]
use crate::traits::TokenService;

/// Whether an entry is still a provider or already a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub enum Relation {
    /// Registered provider that has not run yet
    NewlyRegistered,
    /// Concrete value; never overwritten
    ResolvedValue,
}

/// What was registered under an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub enum Kind {
    /// A constructor
    Callable,
    /// A struct template assembled field by field
    Composite,
    /// A plain value
    Other,
}

/// Lifecycle classification of an entry.
///
/// ```text
/// NotAService
/// PendingUp --start--> RunningUp --stop--> PendingUp
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(serde::Serialize))]
pub enum ServiceState {
    /// No recognized start/stop shape
    NotAService,
    /// A service waiting for its `up` hook
    PendingUp,
    /// A service whose `up` hook has been called
    RunningUp,
}

/// Start/stop hooks of a value, as found by the capability probe.
#[derive(Clone)]
pub(crate) enum Hooks {
    Plain(Arc<dyn Service>),
    Context(Arc<dyn ContextService>),
    #[cfg(feature = "tokio")]
    Token(Arc<dyn TokenService>),
}

/// What a start hook may receive.
pub(crate) struct UpArgs<'a> {
    pub(crate) context: &'a Context,
    #[cfg(feature = "tokio")]
    pub(crate) token: &'a tokio_util::sync::CancellationToken,
}

impl Hooks {
    /// Probes the recognized shapes in priority order.
    pub(crate) fn probe<T: ?Sized + Injectable>(value: &Arc<T>) -> Option<Self> {
        if let Some(service) = T::as_service(Arc::clone(value)) {
            return Some(Hooks::Plain(service));
        }
        if let Some(service) = T::as_context_service(Arc::clone(value)) {
            return Some(Hooks::Context(service));
        }
        #[cfg(feature = "tokio")]
        let token = T::as_token_service(Arc::clone(value)).map(Hooks::Token);
        #[cfg(not(feature = "tokio"))]
        let token = None;
        token
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Hooks::Plain(_) => "plain",
            Hooks::Context(_) => "context",
            #[cfg(feature = "tokio")]
            Hooks::Token(_) => "token",
        }
    }

    pub(crate) fn up(&self, args: &UpArgs<'_>) -> anyhow::Result<()> {
        match self {
            Hooks::Plain(service) => service.up(),
            Hooks::Context(service) => service.up(args.context),
            #[cfg(feature = "tokio")]
            Hooks::Token(service) => service.up(args.token),
        }
    }

    pub(crate) fn down(&self) -> anyhow::Result<()> {
        match self {
            Hooks::Plain(service) => service.down(),
            Hooks::Context(service) => service.down(),
            #[cfg(feature = "tokio")]
            Hooks::Token(service) => service.down(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Both {
        plain_ups: AtomicUsize,
        context_ups: AtomicUsize,
    }

    impl Service for Both {
        fn up(&self) -> anyhow::Result<()> {
            self.plain_ups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn down(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl ContextService for Both {
        fn up(&self, _ctx: &Context) -> anyhow::Result<()> {
            self.context_ups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn down(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl Injectable for Both {
        fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
            Some(self)
        }
        fn as_context_service(self: Arc<Self>) -> Option<Arc<dyn ContextService>> {
            Some(self)
        }
    }

    struct Plain;
    impl Injectable for Plain {}

    #[test]
    fn plain_shape_wins_over_context_shape() {
        let both = Arc::new(Both::default());
        let hooks = Hooks::probe(&both).unwrap();
        assert_eq!(hooks.shape(), "plain");

        let ctx = Context::new();
        #[cfg(feature = "tokio")]
        let token = tokio_util::sync::CancellationToken::new();
        let args = UpArgs {
            context: &ctx,
            #[cfg(feature = "tokio")]
            token: &token,
        };
        hooks.up(&args).unwrap();
        assert_eq!(both.plain_ups.load(Ordering::SeqCst), 1);
        assert_eq!(both.context_ups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn values_without_hooks_are_not_services() {
        assert!(Hooks::probe(&Arc::new(Plain)).is_none());
    }

    #[test]
    fn shapes_are_found_through_nested_arcs() {
        let inner: Arc<Both> = Arc::new(Both::default());
        let outer: Arc<Arc<Both>> = Arc::new(inner);
        assert!(Hooks::probe(&outer).is_some());
    }
}
