//! Tool handlers the dispatcher routes to.

mod discovery;
mod rag;
mod sql;

pub use discovery::DiscoveryHandler;
pub use rag::RagHandler;
pub use sql::SqlHandler;
