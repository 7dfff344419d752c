use serde::{Deserialize, Serialize};

/// An intercepted or outgoing request: method, URL and headers, all opaque.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRequest {
  pub method: String,
  pub url: String,
  /// Carried verbatim, never parsed.
  #[serde(default)]
  pub headers: Vec<(String, String)>,
}

impl AssetRequest {
  /// A GET request for the given URL or path.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: "GET".to_string(),
      url: url.into(),
      headers: Vec::new(),
    }
  }

  pub fn is_get(&self) -> bool {
    self.method.eq_ignore_ascii_case("GET")
  }
}

/// A delivered response. An HTTP error status is still a delivered response;
/// transport failures surface as errors from [`super::Fetcher::fetch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetResponse {
  pub status: u16,
  #[serde(default)]
  pub headers: Vec<(String, String)>,
  #[serde(default)]
  pub body: Vec<u8>,
}

impl AssetResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}
