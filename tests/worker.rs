//! End-to-end lifecycle tests against the in-memory cache registry and a
//! scripted fetcher that counts network calls.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use offcache::{
  ActivationPolicy, AssetRequest, AssetResponse, CacheRegistry, Fetcher, Handled, MemoryCaches,
  WorkerConfig, WorkerController, WorkerEvent, WorkerState,
};

/// Route worker tracing through the test writer, filtered by RUST_LOG.
fn init_tracing() {
  static INIT: Once = Once::new();
  INIT.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  });
}

/// Fetcher with canned responses per URL and a network call counter.
#[derive(Default)]
struct ScriptedFetcher {
  responses: Mutex<HashMap<String, AssetResponse>>,
  failing: Mutex<HashSet<String>>,
  calls: AtomicUsize,
}

impl ScriptedFetcher {
  fn new() -> Self {
    Self::default()
  }

  fn respond(&self, url: &str, status: u16, body: &str) {
    self.responses.lock().unwrap().insert(
      url.to_string(),
      AssetResponse {
        status,
        headers: vec![("x-origin".to_string(), "network".to_string())],
        body: body.as_bytes().to_vec(),
      },
    );
  }

  fn fail(&self, url: &str) {
    self.failing.lock().unwrap().insert(url.to_string());
  }

  fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn reset_calls(&self) {
    self.calls.store(0, Ordering::SeqCst);
  }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    if self.failing.lock().unwrap().contains(&request.url) {
      return Err(eyre!("connection refused: {}", request.url));
    }

    match self.responses.lock().unwrap().get(&request.url) {
      Some(response) => Ok(response.clone()),
      None => Ok(AssetResponse {
        status: 404,
        headers: Vec::new(),
        body: Vec::new(),
      }),
    }
  }
}

const ASSETS: [&str; 3] = ["/", "/index.html", "/logo.svg"];

fn worker_with(
  cache_name: &str,
  caches: Arc<MemoryCaches>,
  fetcher: Arc<ScriptedFetcher>,
) -> WorkerController<MemoryCaches, ScriptedFetcher> {
  let config = WorkerConfig::new(cache_name, ASSETS.iter().map(|s| s.to_string()).collect());
  WorkerController::new(config, caches, fetcher)
}

fn scripted_assets() -> Arc<ScriptedFetcher> {
  init_tracing();

  let fetcher = Arc::new(ScriptedFetcher::new());
  fetcher.respond("/", 200, "root");
  fetcher.respond("/index.html", 200, "index");
  fetcher.respond("/logo.svg", 200, "logo");
  fetcher
}

async fn fetch(
  worker: &mut WorkerController<MemoryCaches, ScriptedFetcher>,
  url: &str,
) -> Result<AssetResponse> {
  match worker
    .dispatch(WorkerEvent::Fetch(AssetRequest::get(url)))
    .await?
  {
    Handled::Response(response) => Ok(response),
    other => panic!("fetch produced {:?}", other),
  }
}

#[tokio::test]
async fn test_installed_assets_are_served_without_network() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  let mut worker = worker_with("app-v1", caches, fetcher.clone());

  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  fetcher.reset_calls();

  for (url, body) in [("/", "root"), ("/index.html", "index"), ("/logo.svg", "logo")] {
    let response = fetch(&mut worker, url).await.unwrap();
    assert_eq!(response.body, body.as_bytes());
  }
  assert_eq!(fetcher.calls(), 0, "cached assets must not touch the network");
}

#[tokio::test]
async fn test_uncached_request_passes_through_exactly_once_verbatim() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  fetcher.respond("/api/data", 503, "maintenance");
  let mut worker = worker_with("app-v1", caches, fetcher.clone());

  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  fetcher.reset_calls();

  let response = fetch(&mut worker, "/api/data").await.unwrap();

  // Returned unmodified, error status included
  assert_eq!(response.status, 503);
  assert_eq!(response.body, b"maintenance");
  assert_eq!(response.headers[0].1, "network");
  assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn test_uncached_requests_are_never_written_back() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  fetcher.respond("/api/data", 200, "fresh");
  let mut worker = worker_with("app-v1", caches, fetcher.clone());

  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  fetcher.reset_calls();

  fetch(&mut worker, "/api/data").await.unwrap();
  fetch(&mut worker, "/api/data").await.unwrap();

  // A cached copy would have absorbed the second call
  assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_activation_deletes_stale_generations() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();

  // A previous generation is still present
  caches.open("app-v1").await.unwrap();
  caches
    .put(
      "app-v1",
      &AssetRequest::get("/old.js"),
      AssetResponse {
        status: 200,
        headers: Vec::new(),
        body: b"old".to_vec(),
      },
    )
    .await
    .unwrap();

  let mut worker = worker_with("app-v2", caches.clone(), fetcher);
  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();

  assert_eq!(caches.keys().await.unwrap(), vec!["app-v2"]);
  assert!(caches
    .match_request(&AssetRequest::get("/old.js"))
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn test_network_failure_for_uncached_request_propagates() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  fetcher.fail("/flaky");
  let mut worker = worker_with("app-v1", caches, fetcher.clone());

  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  fetcher.reset_calls();

  let result = fetch(&mut worker, "/flaky").await;
  assert!(result.is_err(), "no fallback content on network failure");
  assert_eq!(fetcher.calls(), 1, "no retry on network failure");
}

#[tokio::test]
async fn test_failed_install_leaves_prior_generations_untouched() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  fetcher.fail("/logo.svg");

  caches.open("app-v1").await.unwrap();

  let mut worker = worker_with("app-v2", caches.clone(), fetcher);
  assert!(worker.dispatch(WorkerEvent::Install).await.is_err());
  assert_eq!(worker.state(), WorkerState::Parked);

  // The failed generation left nothing behind, complete or partial
  assert_eq!(caches.keys().await.unwrap(), vec!["app-v1"]);
  assert!(caches
    .match_request(&AssetRequest::get("/index.html"))
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn test_install_fails_on_error_status_asset() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  fetcher.respond("/logo.svg", 500, "boom");

  let mut worker = worker_with("app-v1", caches.clone(), fetcher);
  assert!(worker.dispatch(WorkerEvent::Install).await.is_err());
  assert!(caches.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activate_twice_is_idempotent() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  let mut worker = worker_with("app-v1", caches.clone(), fetcher);

  worker.dispatch(WorkerEvent::Install).await.unwrap();
  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  let before = caches.keys().await.unwrap();

  worker.dispatch(WorkerEvent::Activate).await.unwrap();
  assert_eq!(caches.keys().await.unwrap(), before);
  assert_eq!(worker.state(), WorkerState::Active);
}

#[tokio::test]
async fn test_conservative_policy_is_surfaced_to_host() {
  let caches = Arc::new(MemoryCaches::new());
  let fetcher = scripted_assets();
  let config = WorkerConfig::new("app-v1", vec!["/".to_string()]).with_policy(ActivationPolicy {
    skip_waiting: false,
    claim_clients: false,
  });
  let mut worker = WorkerController::new(config, caches, fetcher);

  let installed = worker.dispatch(WorkerEvent::Install).await.unwrap();
  assert_eq!(
    installed,
    Handled::Installed {
      skip_waiting: false
    }
  );

  let activated = worker.dispatch(WorkerEvent::Activate).await.unwrap();
  assert_eq!(
    activated,
    Handled::Activated {
      claim_clients: false
    }
  );
}
