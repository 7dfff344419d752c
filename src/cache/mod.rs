//! Versioned cache stores behind an injected registry abstraction.
//!
//! The registry replaces a process-global cache namespace with an explicit
//! dependency: named stores can be opened, enumerated, deleted wholesale and
//! matched against requests. Two backends are provided: an in-memory one
//! (also the test fake) and a SQLite-backed one that survives restarts.

mod memory;
mod registry;
mod sqlite;

pub use memory::MemoryCaches;
pub use registry::{CacheRegistry, CachedResponse};
pub use sqlite::SqliteCaches;
