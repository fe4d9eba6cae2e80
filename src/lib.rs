//! # bootkit
//!
//! Application bootstrapping around a dependency container that works out
//! the wiring by itself.
//!
//! ## Features
//!
//! - **Inferred wiring**: constructors declare what they need through their
//!   parameter types and what they provide through their return type
//! - **Ordered lifecycle**: services start in dependency order and stop in
//!   exact reverse order, including services only known after a constructor ran
//! - **Late services**: outputs of constructors and `invoke` calls that turn
//!   out to be services are started and tracked like registered ones
//! - **Cycle detection**: a cyclic registration fails with the cycle's path
//! - **Introspection**: entry descriptors and graph export (DOT, Mermaid,
//!   JSON/YAML with the `graph-export` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use bootkit::{constructor, value, Container, Injectable, Service};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! struct DatabaseUrl(String);
//! bootkit::injectable!(DatabaseUrl);
//!
//! struct Database {
//!     url: String,
//!     open: AtomicBool,
//! }
//!
//! impl Service for Database {
//!     fn up(&self) -> anyhow::Result<()> {
//!         self.open.store(true, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     fn down(&self) -> anyhow::Result<()> {
//!         self.open.store(false, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! impl Injectable for Database {
//!     fn as_service(self: Arc<Self>) -> Option<Arc<dyn Service>> {
//!         Some(self)
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .register([
//!         value(DatabaseUrl("postgres://localhost".to_string())),
//!         constructor(|url: Arc<DatabaseUrl>| Database {
//!             url: url.0.clone(),
//!             open: AtomicBool::new(false),
//!         }),
//!     ])
//!     .unwrap();
//!
//! container.start().unwrap();
//! let db = container.resolve::<Database>().unwrap();
//! assert!(db.open.load(Ordering::SeqCst));
//!
//! container.stop().unwrap();
//! assert!(!db.open.load(Ordering::SeqCst));
//! ```
//!
//! ## Multiple Outputs and Errors
//!
//! A constructor may return a tuple to provide several dependencies at once,
//! and a `Result` to fail the start:
//!
//! ```rust
//! use bootkit::{constructor, Container, DiError};
//! use std::sync::Arc;
//!
//! struct Reader;
//! struct Writer;
//! bootkit::injectable!(Reader, Writer);
//!
//! let container = Container::new();
//! container
//!     .register([
//!         constructor(|| (Reader, Writer)),
//!         constructor(|_: Arc<Writer>| -> anyhow::Result<()> {
//!             anyhow::bail!("disk full")
//!         }),
//!     ])
//!     .unwrap();
//!
//! match container.start() {
//!     Err(DiError::Constructor { source, .. }) => assert_eq!(source.to_string(), "disk full"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```
//!
//! ## Applications
//!
//! [`Application`] runs a container through `register → start → run → stop`
//! with every step logged through `tracing`.

pub mod app;
pub mod cancellation;
pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod graph;
pub mod graph_export;
pub mod key;
pub mod lifecycle;
pub mod provider;
pub mod traits;

mod executor;
mod internal;
mod storage;

pub use app::Application;
pub use cancellation::{Cancelled, Context};
pub use config::{
    AppConfig, ConfigSource, ConfigValue, ContainerConfig, EnvironmentConfigSource,
    MapConfigSource, ENV_PREFIX,
};
pub use container::Container;
pub use descriptors::EntryDescriptor;
pub use error::{DiError, DiResult, StopFailure};
pub use graph::{DependencyGraph, Node};
pub use graph_export::{
    DefaultGraphExporter, ExportFormat, GraphEdge, GraphExport, GraphExporter, GraphMetadata,
    GraphNode,
};
pub use key::{derive_address, Address, Identity, Shape, TypeDescriptor, ERROR_ADDRESS};
pub use lifecycle::{Kind, Relation, ServiceState};
pub use provider::{
    constructor, field, shared, template, value, Composite, Constructor, Field, FieldValues,
    IntoOutputs, Item, Param, Produced,
};
#[cfg(feature = "tokio")]
pub use traits::TokenService;
pub use traits::{ContextService, Injectable, Service};
