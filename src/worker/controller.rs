use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::lifecycle::{Handled, WorkerEvent, WorkerState};
use crate::cache::CacheRegistry;
use crate::config::WorkerConfig;
use crate::net::{AssetRequest, AssetResponse, Fetcher};

/// Owns the cache store for the current cache generation and serves the
/// three lifecycle operations against it.
///
/// The cache registry and the fetcher are injected so a host can back the
/// controller with real HTTP and durable storage, and tests can substitute
/// in-memory fakes.
pub struct WorkerController<C: CacheRegistry, F: Fetcher> {
  config: WorkerConfig,
  caches: Arc<C>,
  fetcher: Arc<F>,
  state: WorkerState,
}

impl<C: CacheRegistry, F: Fetcher> WorkerController<C, F> {
  pub fn new(config: WorkerConfig, caches: Arc<C>, fetcher: Arc<F>) -> Self {
    Self {
      config,
      caches,
      fetcher,
      state: WorkerState::Parked,
    }
  }

  pub fn state(&self) -> WorkerState {
    self.state
  }

  /// Handle one lifecycle event. The host awaits the result before moving
  /// the worker to the next phase.
  pub async fn dispatch(&mut self, event: WorkerEvent) -> Result<Handled> {
    match event {
      WorkerEvent::Install => self.install().await,
      WorkerEvent::Activate => self.activate().await,
      WorkerEvent::Fetch(request) => {
        let response = self.handle_fetch(&request).await?;
        Ok(Handled::Response(response))
      }
    }
  }

  /// Pre-fetch every asset into the current cache store.
  ///
  /// All-or-nothing: any transport failure or non-success status aborts the
  /// install, the partially populated store is deleted, and the error
  /// propagates so the host keeps the previous version in control.
  async fn install(&mut self) -> Result<Handled> {
    if self.state != WorkerState::Parked {
      return Err(eyre!(
        "Install dispatched in {:?} state, expected Parked",
        self.state
      ));
    }
    self.state = WorkerState::Installing;

    info!(
      cache = %self.config.cache_name,
      assets = self.config.assets.len(),
      "installing"
    );

    match self.populate().await {
      Ok(()) => {
        self.state = WorkerState::Installed;
        Ok(Handled::Installed {
          skip_waiting: self.config.policy.skip_waiting,
        })
      }
      Err(e) => {
        // Leave no partial store of the failed version behind
        if let Err(cleanup) = self.caches.delete(&self.config.cache_name).await {
          warn!(cache = %self.config.cache_name, error = %cleanup, "cleanup after failed install failed");
        }
        self.state = WorkerState::Parked;
        Err(e.wrap_err(format!("Install of {} failed", self.config.cache_name)))
      }
    }
  }

  async fn populate(&self) -> Result<()> {
    self.caches.open(&self.config.cache_name).await?;

    // Fetch the whole asset list before writing anything
    let requests: Vec<AssetRequest> = self
      .config
      .assets
      .iter()
      .map(|path| AssetRequest::get(path.clone()))
      .collect();

    let responses = try_join_all(requests.iter().map(|request| async move {
      let response = self.fetcher.fetch(request).await?;
      if !response.is_success() {
        return Err(eyre!(
          "Asset {} responded with status {}",
          request.url,
          response.status
        ));
      }
      Ok(response)
    }))
    .await?;

    for (request, response) in requests.iter().zip(responses) {
      self
        .caches
        .put(&self.config.cache_name, request, response)
        .await?;
    }

    Ok(())
  }

  /// Delete every cache generation except the current one.
  ///
  /// Idempotent: re-activating an already active worker re-runs the sweep,
  /// finds nothing stale and changes nothing.
  async fn activate(&mut self) -> Result<Handled> {
    let resume = match self.state {
      WorkerState::Installed | WorkerState::Active => self.state,
      other => {
        return Err(eyre!(
          "Activate dispatched in {:?} state, expected Installed or Active",
          other
        ))
      }
    };
    self.state = WorkerState::Activating;

    match self.sweep_stale().await {
      Ok(()) => {
        self.state = WorkerState::Active;
        Ok(Handled::Activated {
          claim_clients: self.config.policy.claim_clients,
        })
      }
      Err(e) => {
        // Fatal to this activation attempt only
        self.state = resume;
        Err(e.wrap_err("Activation failed"))
      }
    }
  }

  async fn sweep_stale(&self) -> Result<()> {
    for name in self.caches.keys().await? {
      if name != self.config.cache_name {
        info!(stale = %name, current = %self.config.cache_name, "deleting stale cache");
        self.caches.delete(&name).await?;
      }
    }

    Ok(())
  }

  /// Serve an intercepted request cache-first.
  ///
  /// A hit returns the stored response without touching the network; a miss
  /// forwards to the network exactly once and returns the result or failure
  /// unmodified. Nothing is ever written to the cache here.
  async fn handle_fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
    if self.state != WorkerState::Active {
      return Err(eyre!(
        "Fetch dispatched in {:?} state, expected Active",
        self.state
      ));
    }

    if let Some(cached) = self.caches.match_request(request).await? {
      debug!(url = %request.url, "cache hit");
      return Ok(cached.response);
    }

    debug!(url = %request.url, "cache miss, passing through");
    self.fetcher.fetch(request).await
  }
}
