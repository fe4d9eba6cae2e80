//! Core traits for the container.

mod injectable;
mod service;

pub use injectable::Injectable;
#[cfg(feature = "tokio")]
pub use service::TokenService;
pub use service::{ContextService, Service};
