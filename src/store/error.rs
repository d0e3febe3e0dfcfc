use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors from a single store round trip.
#[derive(Debug, Error)]
pub enum StoreError {
  /// The request never produced a response (connection, DNS, TLS, ...).
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// The store answered with a non-success status.
  #[error("store returned {status} for {method} {path}")]
  Status {
    method: Method,
    path: String,
    status: StatusCode,
  },

  /// The response body could not be decoded.
  #[error("could not decode store response: {0}")]
  Decode(#[source] reqwest::Error),
}
