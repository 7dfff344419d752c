use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use url::Url;

use super::types::{AssetRequest, AssetResponse};

/// The network fetch seam: one asynchronous request-to-response primitive.
///
/// Implementations return `Err` only for transport failures (connection
/// refused, DNS, aborted body). A response with an error status is delivered
/// as `Ok` so interception can hand it back unmodified.
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse>;
}

/// Fetcher backed by a real HTTP client.
///
/// Asset lists use origin-relative paths ("/", "/index.html"); those are
/// resolved against the configured origin before dispatch.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: Url,
}

impl HttpFetcher {
  pub fn new(origin: &str) -> Result<Self> {
    let origin = Url::parse(origin).map_err(|e| eyre!("Invalid origin {}: {}", origin, e))?;

    Ok(Self {
      client: reqwest::Client::new(),
      origin,
    })
  }

  /// Resolve a possibly origin-relative URL against the configured origin.
  fn resolve(&self, url: &str) -> Result<Url> {
    if let Ok(absolute) = Url::parse(url) {
      return Ok(absolute);
    }

    self
      .origin
      .join(url)
      .map_err(|e| eyre!("Cannot resolve {} against {}: {}", url, self.origin, e))
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse> {
    let url = self.resolve(&request.url)?;

    let method = reqwest::Method::from_bytes(request.method.as_bytes())
      .map_err(|e| eyre!("Invalid method {}: {}", request.method, e))?;

    let mut builder = self.client.request(method, url.clone());
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| eyre!("Network fetch of {} failed: {}", url, e))?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .map(|(name, value)| {
        (
          name.to_string(),
          String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
      })
      .collect();

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", url, e))?
      .to_vec();

    Ok(AssetResponse {
      status,
      headers,
      body,
    })
  }
}
