//! Service lifecycle traits.

use crate::cancellation::Context;

/// A service with plain start/stop hooks.
///
/// Implement this trait for objects that must be brought up once their
/// dependencies exist and torn down in reverse start order (e.g., opening a
/// listener, flushing a cache). Expose it to the container by overriding
/// [`Injectable::as_service`](crate::Injectable::as_service).
///
/// # Examples
///
/// ```
/// use bootkit::{Container, Injectable, Service, value};
/// use std::sync::Arc;
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Service for Cache {
///     fn up(&self) -> anyhow::Result<()> {
///         println!("Warming cache: {}", self.name);
///         Ok(())
///     }
///
///     fn down(&self) -> anyhow::Result<()> {
///         println!("Flushing cache: {}", self.name);
///         Ok(())
///     }
/// }
///
/// impl Injectable for Cache {
///     fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
///         Some(self)
///     }
/// }
///
/// let container = Container::new();
/// container.register([value(Cache { name: "users".to_string() })]).unwrap();
/// container.start().unwrap();
/// container.stop().unwrap();
/// ```
pub trait Service: Send + Sync + 'static {
    /// Starts the service.
    fn up(&self) -> anyhow::Result<()>;

    /// Stops the service.
    fn down(&self) -> anyhow::Result<()>;
}

/// A service whose start hook observes the container's [`Context`].
///
/// Expose it by overriding
/// [`Injectable::as_context_service`](crate::Injectable::as_context_service).
pub trait ContextService: Send + Sync + 'static {
    /// Starts the service with the container's cancellation context.
    fn up(&self, ctx: &Context) -> anyhow::Result<()>;

    /// Stops the service.
    fn down(&self) -> anyhow::Result<()>;
}

/// A service whose start hook takes tokio's cancellation token.
///
/// Expose it by overriding
/// [`Injectable::as_token_service`](crate::Injectable::as_token_service).
#[cfg(feature = "tokio")]
pub trait TokenService: Send + Sync + 'static {
    /// Starts the service with the container's external cancellation token.
    fn up(&self, token: &tokio_util::sync::CancellationToken) -> anyhow::Result<()>;

    /// Stops the service.
    fn down(&self) -> anyhow::Result<()>;
}
