use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Result;

use crate::net::{AssetRequest, AssetResponse};

/// A stored response plus storage metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
  pub response: AssetResponse,
  /// When the entry was written during install.
  pub stored_at: DateTime<Utc>,
}

/// Registry of named, versioned cache stores.
///
/// Entries are keyed by URL; only GET requests are matched. Stores are
/// created on install, populated once, and deleted wholesale when a newer
/// cache generation activates. There is no per-entry invalidation.
#[async_trait]
pub trait CacheRegistry: Send + Sync {
  /// Open the named store, creating it if absent. Idempotent.
  async fn open(&self, name: &str) -> Result<()>;

  /// Enumerate all store names.
  async fn keys(&self) -> Result<Vec<String>>;

  /// Delete the named store and all its entries.
  /// Returns `false` (not an error) when the store is already absent.
  async fn delete(&self, name: &str) -> Result<bool>;

  /// Store a response under the request's URL in the named store.
  async fn put(&self, name: &str, request: &AssetRequest, response: AssetResponse) -> Result<()>;

  /// Look the request up across all stores. Non-GET requests never match.
  async fn match_request(&self, request: &AssetRequest) -> Result<Option<CachedResponse>>;
}
