//! The container's own cancellation context.
//!
//! A [`Context`] is registered in every container as a resolvable value, so
//! constructors can take `Arc<Context>` and services implementing
//! [`ContextService`](crate::ContextService) receive it in their `up` hook.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// A cancellation context shared between the container and its services.
///
/// Cloning is cheap; clones observe the same flag. Child contexts are
/// cancelled when any ancestor is.
///
/// # Examples
///
/// ```
/// use bootkit::{Container, Context};
/// use std::sync::Arc;
///
/// let ctx = Context::new();
/// let container = Container::with_context(ctx.clone());
/// container.start().unwrap();
///
/// container
///     .invoke(|resolved: Arc<Context>| assert!(!resolved.is_cancelled()))
///     .unwrap();
///
/// ctx.cancel();
/// container
///     .invoke(|resolved: Arc<Context>| assert!(resolved.is_cancelled()))
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    cancelled: AtomicBool,
    parent: Option<Context>,
    created_at: Instant,
}

impl Context {
    /// Creates a new, uncancelled context.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                parent: None,
                created_at: Instant::now(),
            }),
        }
    }

    /// Creates a child context that is cancelled when either it or this
    /// context is cancelled.
    ///
    /// # Examples
    ///
    /// ```
    /// use bootkit::Context;
    ///
    /// let parent = Context::new();
    /// let child = parent.child();
    ///
    /// parent.cancel();
    /// assert!(child.is_cancelled());
    /// ```
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                parent: Some(self.clone()),
                created_at: Instant::now(),
            }),
        }
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if this context or any ancestor was cancelled.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }

        match self.inner.parent {
            Some(ref parent) => parent.is_cancelled(),
            None => false,
        }
    }

    /// Returns `Err` if the context was cancelled.
    ///
    /// Handy at the top of a long `up` hook:
    ///
    /// ```
    /// use bootkit::Context;
    ///
    /// let ctx = Context::new();
    /// assert!(ctx.check().is_ok());
    /// ctx.cancel();
    /// assert!(ctx.check().is_err());
    /// ```
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Time since this context was created.
    pub fn elapsed(&self) -> Duration {
        self.inner.created_at.elapsed()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

/// Returned by [`Context::check`] once the context is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("context cancelled")]
pub struct Cancelled;
