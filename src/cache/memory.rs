use async_trait::async_trait;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use super::registry::{CachedResponse, CacheRegistry};
use crate::net::{AssetRequest, AssetResponse};

/// In-memory cache registry.
///
/// Ephemeral backend and the substitute used in tests. Stores are kept in
/// creation order so `keys()` enumerates oldest-first.
#[derive(Default)]
pub struct MemoryCaches {
  stores: Mutex<Vec<Store>>,
}

struct Store {
  name: String,
  entries: HashMap<String, CachedResponse>,
}

impl MemoryCaches {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CacheRegistry for MemoryCaches {
  async fn open(&self, name: &str) -> Result<()> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    if stores.iter().all(|s| s.name != name) {
      stores.push(Store {
        name: name.to_string(),
        entries: HashMap::new(),
      });
    }

    Ok(())
  }

  async fn keys(&self) -> Result<Vec<String>> {
    let stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(stores.iter().map(|s| s.name.clone()).collect())
  }

  async fn delete(&self, name: &str) -> Result<bool> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let before = stores.len();
    stores.retain(|s| s.name != name);

    Ok(stores.len() < before)
  }

  async fn put(&self, name: &str, request: &AssetRequest, response: AssetResponse) -> Result<()> {
    let mut stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let store = stores
      .iter_mut()
      .find(|s| s.name == name)
      .ok_or_else(|| eyre!("Cache store {} does not exist", name))?;

    store.entries.insert(
      request.url.clone(),
      CachedResponse {
        response,
        stored_at: Utc::now(),
      },
    );

    Ok(())
  }

  async fn match_request(&self, request: &AssetRequest) -> Result<Option<CachedResponse>> {
    if !request.is_get() {
      return Ok(None);
    }

    let stores = self
      .stores
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(
      stores
        .iter()
        .find_map(|s| s.entries.get(&request.url).cloned()),
    )
  }
}
