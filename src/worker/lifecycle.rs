use crate::net::{AssetRequest, AssetResponse};

/// Lifecycle phase of the worker.
///
/// Transitions are one-directional and driven by the host dispatching
/// events: `Parked → Installing → Installed → Activating → Active`. A failed
/// install falls back to `Parked` so the host can retry; a failed activation
/// falls back to the phase it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// Registered but not yet installed.
  Parked,
  /// Pre-fetching the asset list into the current cache store.
  Installing,
  /// Installed and waiting for the host to activate this version.
  Installed,
  /// Deleting stale cache generations.
  Activating,
  /// Serving intercepted fetches.
  Active,
}

/// Lifecycle events the hosting runtime dispatches to the controller.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
  Install,
  Activate,
  Fetch(AssetRequest),
}

/// Outcome of a dispatched event.
///
/// The lifecycle variants carry the worker's requests back to the host: a
/// freshly installed version may ask to be promoted without the waiting
/// phase, and an activating version may ask for control of already-open
/// clients. Honoring them is the host's call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
  Installed { skip_waiting: bool },
  Activated { claim_clients: bool },
  Response(AssetResponse),
}
