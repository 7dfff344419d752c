//! Cache-first offline asset worker.
//!
//! Implements the install/activate/fetch lifecycle of a network-intercepting
//! worker against an injected cache registry and network fetcher:
//! - A fixed asset list is eagerly fetched and stored under a versioned cache
//!   name at install time
//! - Activation deletes every cache generation except the current one
//! - Intercepted fetches are served cache-first, falling back to the network
//!   without ever writing back to the cache
//!
//! The hosting side drives the lifecycle by dispatching [`WorkerEvent`]s to a
//! [`WorkerController`] and awaiting the result before promoting the worker
//! to the next phase.

pub mod cache;
pub mod config;
pub mod net;
pub mod worker;

pub use cache::{CacheRegistry, CachedResponse, MemoryCaches, SqliteCaches};
pub use config::{ActivationPolicy, WorkerConfig};
pub use net::{AssetRequest, AssetResponse, Fetcher, HttpFetcher};
pub use worker::{Handled, WorkerController, WorkerEvent, WorkerState};
