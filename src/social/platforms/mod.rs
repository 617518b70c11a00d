//! Platform publish adapters
//!
//! One module per platform, each knowing how to turn an access token, a
//! caption, an image, and a claim link into exactly one publish flow against
//! that platform's HTTP API.

pub mod facebook;
pub mod instagram;
pub mod registry;
pub mod tiktok;
pub mod trait_;
pub mod twitter;

pub use registry::{AdapterRegistry, RegistryError};
pub use trait_::{AdapterError, PlatformAdapter};

/// Extract a readable message from a Meta Graph API error response body
/// (`{"error": {"message": ...}}`), falling back to the raw body.
pub(crate) async fn graph_api_error(resp: reqwest::Response) -> AdapterError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);
    AdapterError::Api { status, message }
}
