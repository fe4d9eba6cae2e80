//! Error types for the container.

use std::fmt;

use thiserror::Error;

use crate::key::Address;

/// Container errors
///
/// Every variant raised while resolving a dependency names the offending
/// [`Address`], so a failure message always points at the slot that broke.
///
/// # Examples
///
/// ```rust
/// use bootkit::{Container, DiError};
/// use std::sync::Arc;
///
/// struct Missing;
/// bootkit::injectable!(Missing);
///
/// let container = Container::new();
/// container.start().unwrap();
///
/// match container.invoke(|_m: Arc<Missing>| {}) {
///     Err(DiError::NotInitiated(address)) => {
///         assert!(address.as_str().ends_with(".Missing"));
///     }
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// A resolved value already occupies the slot
    #[error("dependency {0} already initiated")]
    AlreadyInitiated(Address),
    /// Nothing resolved the slot
    #[error("dependency {0} not initiated")]
    NotInitiated(Address),
    /// The type cannot be addressed as a dependency
    #[error("dependency is not supported: {type_name}")]
    Unsupported { type_name: &'static str },
    /// A stored value could not be downcast to the requested type
    #[error("type mismatch for {address}: expected {type_name}")]
    TypeMismatch {
        address: Address,
        type_name: &'static str,
    },
    /// A constructor returned its own error
    #[error("constructor {address} failed: {source}")]
    Constructor {
        address: Address,
        #[source]
        source: anyhow::Error,
    },
    /// A composite template asked for a field it never declared
    #[error("template {address} has no resolved field {field}")]
    MissingField { address: Address, field: String },
    /// A composite template failed to assemble itself
    #[error("template {address} failed to assemble: {source}")]
    Assemble {
        address: Address,
        #[source]
        source: Box<DiError>,
    },
    /// The graph has a cycle (closed path, first node repeated last)
    #[error("dependency graph calculation failed: cycle {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
    /// The topological order could not be computed
    #[error("dependency graph calculation failed: {0}")]
    GraphCalculation(String),
    /// A service's start hook failed
    #[error("service {address} failed to start: {source}")]
    ServiceStart {
        address: String,
        #[source]
        source: anyhow::Error,
    },
    /// One or more stop hooks failed
    #[error("{}", StopFailures(.0))]
    Stop(Vec<StopFailure>),
    /// A value was promoted to a service without a recognized shape
    #[error("unknown service shape for {0}")]
    UnknownServiceShape(String),
    /// `start` called on a running container
    #[error("container already started")]
    AlreadyStarted,
    /// The operation needs a running container
    #[error("container not started")]
    NotStarted,
    /// Registration attempted while the container is running
    #[error("cannot register while the container is running")]
    Running,
    /// The service history was driven out of order
    #[error("service history: {0}")]
    TrackerState(&'static str),
    /// A graph could not be rendered in the requested format
    #[error("graph export failed: {0}")]
    Export(String),
    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DiError {
    /// The error a constructor or lifecycle hook returned, if this error wraps one.
    pub fn hook_error(&self) -> Option<&anyhow::Error> {
        match self {
            DiError::Constructor { source, .. } | DiError::ServiceStart { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }

    /// The address this error is about, when it names one.
    pub fn address(&self) -> Option<&str> {
        match self {
            DiError::AlreadyInitiated(a)
            | DiError::NotInitiated(a)
            | DiError::TypeMismatch { address: a, .. }
            | DiError::Constructor { address: a, .. }
            | DiError::MissingField { address: a, .. }
            | DiError::Assemble { address: a, .. } => Some(a.as_str()),
            DiError::ServiceStart { address, .. } | DiError::UnknownServiceShape(address) => {
                Some(address)
            }
            _ => None,
        }
    }
}

/// One failed stop hook collected during shutdown.
#[derive(Debug)]
pub struct StopFailure {
    /// Label of the service whose `down` hook failed
    pub service: String,
    /// The hook's error
    pub error: anyhow::Error,
}

impl fmt::Display for StopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.error)
    }
}

struct StopFailures<'a>(&'a [StopFailure]);

impl fmt::Display for StopFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} service(s) failed to stop", self.0.len())?;
        for (i, failure) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, failure)?;
        }
        Ok(())
    }
}

/// Result type for container operations
///
/// A convenience type alias for `Result<T, DiError>` used throughout bootkit.
///
/// # Examples
///
/// ```rust
/// use bootkit::{DiResult, DiError};
///
/// fn start_everything() -> DiResult<()> {
///     Err(DiError::NotStarted)
/// }
///
/// assert!(start_everything().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
