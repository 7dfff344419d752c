use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::Path;

/// Worker configuration: the versioned cache name and the fixed asset list,
/// normally supplied by the surrounding build/deployment process.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
  /// Versioned cache identifier, e.g. "fifths-cache-v.0.1.1".
  /// Exactly one identifier is current at any time; activation deletes the rest.
  pub cache_name: String,

  /// Request paths to pre-fetch and store at install time.
  /// Static after load; never mutated at runtime.
  pub assets: Vec<String>,

  #[serde(default)]
  pub policy: ActivationPolicy,
}

/// How aggressively a freshly installed version takes over.
///
/// The defaults reproduce the fast-rollout choice of skipping the waiting
/// phase and claiming already-open clients, trading a transient window of
/// mixed asset versions for immediate control. Set both to `false` for the
/// conservative wait-for-all-clients-to-close behavior.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ActivationPolicy {
  /// Promote the installed version without waiting for existing clients to close.
  #[serde(default = "default_true")]
  pub skip_waiting: bool,

  /// Take control of already-open clients on activation, not only new ones.
  #[serde(default = "default_true")]
  pub claim_clients: bool,
}

fn default_true() -> bool {
  true
}

impl Default for ActivationPolicy {
  fn default() -> Self {
    Self {
      skip_waiting: true,
      claim_clients: true,
    }
  }
}

impl WorkerConfig {
  /// Build a configuration directly in code.
  pub fn new(cache_name: impl Into<String>, assets: Vec<String>) -> Self {
    Self {
      cache_name: cache_name.into(),
      assets,
      policy: ActivationPolicy::default(),
    }
  }

  pub fn with_policy(mut self, policy: ActivationPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Load configuration from a YAML file.
  pub fn load(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read worker config {}: {}", path.display(), e))?;

    let config: WorkerConfig = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse worker config {}: {}", path.display(), e))?;

    if config.cache_name.is_empty() {
      return Err(eyre!(
        "Worker config {} has an empty cache_name",
        path.display()
      ));
    }

    Ok(config)
  }
}
