//! The container facade: `register`, `start`, `invoke`, `stop`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cancellation::Context;
use crate::config::ContainerConfig;
use crate::descriptors::EntryDescriptor;
use crate::error::{DiError, DiResult};
use crate::executor::Executor;
use crate::graph::DependencyGraph;
use crate::internal::{ServiceHistory, TrackerState};
use crate::key::{derive_address, Address};
use crate::lifecycle::UpArgs;
use crate::provider::{Constructor, ConstructorHandle, Item, Param, Produced};
use crate::storage::ObjectStorage;
use crate::traits::Injectable;

/// Dependency container with an ordered service lifecycle.
///
/// ```text
/// Off --register*--> Off --start--> On --stop--> Off
/// ```
///
/// Registration is only legal while off. [`start`](Self::start) orders every
/// registered item by its dependencies, runs constructors, assembles
/// templates and starts services in that order. [`stop`](Self::stop) stops
/// them in exact reverse order and is safe to call at any time.
///
/// # Examples
///
/// ```
/// use bootkit::{constructor, value, Container, Injectable, Service};
/// use std::sync::Arc;
///
/// struct Settings {
///     addr: String,
/// }
/// impl Injectable for Settings {}
///
/// struct Server {
///     addr: String,
/// }
///
/// impl Service for Server {
///     fn up(&self) -> anyhow::Result<()> {
///         println!("listening on {}", self.addr);
///         Ok(())
///     }
///
///     fn down(&self) -> anyhow::Result<()> {
///         Ok(())
///     }
/// }
///
/// impl Injectable for Server {
///     fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
///         Some(self)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register([
///         value(Settings { addr: "127.0.0.1:8080".to_string() }),
///         constructor(|s: Arc<Settings>| Server { addr: s.addr.clone() }),
///     ])
///     .unwrap();
///
/// container.start().unwrap();
/// container
///     .invoke(|server: Arc<Server>| assert_eq!(server.addr, "127.0.0.1:8080"))
///     .unwrap();
/// container.stop().unwrap();
/// ```
pub struct Container {
    config: ContainerConfig,
    running: AtomicBool,
    storage: ObjectStorage,
    history: ServiceHistory,
    context: Context,
    #[cfg(feature = "tokio")]
    token: tokio_util::sync::CancellationToken,
}

impl Container {
    pub fn new() -> Self {
        Self::build(ContainerConfig::default(), Context::new())
    }

    /// Creates a container whose services receive `context`.
    pub fn with_context(context: Context) -> Self {
        Self::build(ContainerConfig::default(), context)
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self::build(config, Context::new())
    }

    /// Creates a container whose token-shaped services receive `token`.
    #[cfg(feature = "tokio")]
    pub fn with_token(token: tokio_util::sync::CancellationToken) -> Self {
        let mut container = Self::unseeded(ContainerConfig::default(), Context::new());
        container.token = token;
        container.seed();
        container
    }

    fn build(config: ContainerConfig, context: Context) -> Self {
        let container = Self::unseeded(config, context);
        container.seed();
        container
    }

    fn unseeded(config: ContainerConfig, context: Context) -> Self {
        Self {
            config,
            running: AtomicBool::new(false),
            storage: ObjectStorage::new(),
            history: ServiceHistory::new(),
            context,
            #[cfg(feature = "tokio")]
            token: tokio_util::sync::CancellationToken::new(),
        }
    }

    // The container's own context (and token) are resolvable dependencies.
    fn seed(&self) {
        // fresh storage, nothing to collide with
        let _ = self.storage.add_value(Produced::new(self.context.clone()));
        #[cfg(feature = "tokio")]
        let _ = self.storage.add_value(Produced::new(self.token.clone()));
    }

    /// Adds items to storage.
    ///
    /// Fails with [`DiError::Running`] once started. A plain value whose slot
    /// already holds one is accepted here and fails the next
    /// [`start`](Self::start) with [`DiError::AlreadyInitiated`]. Items
    /// before a failing one stay registered.
    pub fn register<I>(&self, items: I) -> DiResult<()>
    where
        I: IntoIterator<Item = Item>,
    {
        if self.is_running() {
            return Err(DiError::Running);
        }
        for item in items {
            let described = item.describe().to_string();
            match self.storage.add(item)? {
                Some(address) => {
                    tracing::debug!(container = %self.config.name, address = %address, "registered")
                }
                None => tracing::debug!(
                    container = %self.config.name,
                    item = %described,
                    "not a dependency, ignored"
                ),
            }
        }
        Ok(())
    }

    /// Resolves everything and starts services in dependency order.
    ///
    /// On failure the container stays off; services started before the
    /// failure keep running until [`stop`](Self::stop) is called, and another
    /// `start` fails with [`DiError::TrackerState`] until then.
    pub fn start(&self) -> DiResult<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DiError::AlreadyStarted);
        }

        let started_at = Instant::now();
        match self.resolve_all() {
            Ok(()) => {
                tracing::info!(
                    container = %self.config.name,
                    services = self.history.len(),
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    "container started"
                );
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                tracing::error!(container = %self.config.name, error = %err, "container failed to start");
                Err(err)
            }
        }
    }

    fn resolve_all(&self) -> DiResult<()> {
        self.history.turn_on()?;
        let graph = DependencyGraph::build(&self.storage)?;
        let order = graph.order()?;
        if self.config.log_order {
            tracing::info!(
                container = %self.config.name,
                order = ?order.iter().map(Address::as_str).collect::<Vec<_>>(),
                "dependency order resolved"
            );
        }
        self.executor().run(&order)
    }

    /// Calls `f` with its parameters resolved from the running container.
    ///
    /// Service-shaped return values are started and recorded, so a later
    /// [`stop`](Self::stop) tears them down too. The callable's own error is
    /// returned as [`DiError::Constructor`].
    pub fn invoke<F, Args, M>(&self, f: F) -> DiResult<()>
    where
        F: Constructor<Args, M>,
    {
        if !self.is_running() {
            return Err(DiError::NotStarted);
        }
        let handle = ConstructorHandle::new(f);
        let executor = self.executor();
        let outputs = executor.call(&handle.address(), &handle)?;
        executor.start_outputs(outputs)
    }

    /// Stops every started service, latest first.
    ///
    /// Idempotent: stopping a stopped container succeeds and calls no hook.
    /// Every `down` hook runs even if earlier ones fail; failures come back
    /// together as [`DiError::Stop`].
    pub fn stop(&self) -> DiResult<()> {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if !self.history.begin_stop() {
            return Ok(());
        }

        tracing::info!(
            container = %self.config.name,
            services = self.history.len(),
            was_running,
            "stopping container"
        );
        let result = self.history.unwind_all();
        let reset = self.storage.reset_running();
        tracing::debug!(container = %self.config.name, reset, "services back to pending");
        result
    }

    /// Typed lookup of a resolved slot.
    pub fn resolve<T: ?Sized + Injectable>(&self) -> DiResult<Arc<T>> {
        if !self.is_running() {
            return Err(DiError::NotStarted);
        }
        let descriptor = <Arc<T> as Param>::descriptor();
        let (address, value) = self.storage.lookup(&descriptor)?;
        <Arc<T> as Param>::extract(&value).ok_or(DiError::TypeMismatch {
            address,
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Address `T` is stored under, if `T` is a dependency.
    pub fn address_of<T: ?Sized + Injectable>() -> Option<Address> {
        match derive_address(&T::descriptor(), None) {
            (address, true) => Some(address),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of stored entries, including the container's own context.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Snapshot of every entry, ordered by address.
    pub fn descriptors(&self) -> Vec<EntryDescriptor> {
        self.storage
            .snapshot()
            .iter()
            .map(EntryDescriptor::from_entry)
            .collect()
    }

    /// Labels of the started services, in start order.
    pub fn started(&self) -> Vec<String> {
        self.history.labels()
    }

    /// Builds the dependency graph of the current storage contents.
    pub fn graph(&self) -> DiResult<DependencyGraph> {
        DependencyGraph::build(&self.storage)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    fn executor(&self) -> Executor<'_> {
        Executor::new(
            &self.storage,
            &self.history,
            UpArgs {
                context: &self.context,
                #[cfg(feature = "tokio")]
                token: &self.token,
            },
        )
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.config.name)
            .field("running", &self.is_running())
            .field("entries", &self.storage.len())
            .field("tracker", &self.history.state())
            .finish()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if self.history.state() == TrackerState::On {
            tracing::warn!(
                container = %self.config.name,
                services = self.history.len(),
                "container dropped without stop"
            );
        }
    }
}
