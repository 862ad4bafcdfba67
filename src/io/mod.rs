//! Edges of the system: the show catalog and identity seams the engine
//! reads from, and the HTTP surface that exposes the workflow.

pub mod catalog;
pub mod http;
pub mod identity;

pub use catalog::{InMemoryShowCatalog, Show, ShowCatalog};
pub use identity::{IdentityProvider, InMemoryIdentityProvider};
