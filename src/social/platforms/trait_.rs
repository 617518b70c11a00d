//! Platform adapter trait definition
//!
//! Defines the interface every platform publisher implements. The central
//! design rule: `publish` never returns an error. All failure modes —
//! network faults, HTTP error statuses, platform-reported error payloads —
//! are folded into a [`PostResult`] with `success: false`, so one platform's
//! failure can never abort the orchestrator's fan-out.

use async_trait::async_trait;

use crate::social::types::{Platform, PostResult, PublishRequest};

/// Internal error taxonomy adapters fold into failed [`PostResult`]s.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The connection or deal is missing something this platform requires;
    /// detected before any network call.
    #[error("{0}")]
    Unusable(String),
}

/// A successful platform publish, before normalization into [`PostResult`].
#[derive(Debug, Clone)]
pub struct Published {
    pub post_id: String,
    pub post_url: Option<String>,
}

#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter publishes to.
    fn platform(&self) -> Platform;

    /// Publish one post for one connection. Never fails; inspect
    /// [`PostResult::success`].
    async fn publish(&self, req: PublishRequest) -> PostResult;
}

/// Fold an adapter's internal outcome into the never-throwing result shape.
pub(crate) fn settle(
    platform: Platform,
    req: &PublishRequest,
    outcome: Result<Published, AdapterError>,
) -> PostResult {
    match outcome {
        Ok(published) => {
            tracing::info!(
                platform = %platform,
                connection_id = %req.connection_id,
                platform_post_id = %published.post_id,
                "Published post"
            );
            PostResult::posted(
                platform,
                req.connection_id,
                published.post_id,
                published.post_url,
            )
        }
        Err(err) => {
            tracing::warn!(
                platform = %platform,
                connection_id = %req.connection_id,
                error = %err,
                "Publish attempt failed"
            );
            PostResult::failed(platform, req.connection_id, err.to_string())
        }
    }
}
