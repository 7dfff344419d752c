//! Request/response model and the network fetch seam.
//!
//! Requests and responses are carried opaquely: headers are stored and
//! forwarded but never interpreted. The [`Fetcher`] trait is the single
//! request-to-response primitive used both for the install-time pre-fetch and
//! for the passthrough fallback during fetch interception.

mod fetcher;
mod types;

pub use fetcher::{Fetcher, HttpFetcher};
pub use types::{AssetRequest, AssetResponse};
