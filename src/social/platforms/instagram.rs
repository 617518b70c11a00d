//! Instagram publish adapter
//!
//! Two-step Graph API content-publishing protocol: create a media container
//! referencing the image URL and caption, wait a short fixed delay for
//! platform-side processing, then publish the container by its creation id.
//! A failure at either step fails the whole post.
//!
//! Instagram captions must not contain the claim link (platform policy);
//! the caption generator produces a "link in bio" variant upstream, so this
//! adapter sends the caption untouched.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::social::platforms::graph_api_error;
use crate::social::platforms::trait_::{AdapterError, PlatformAdapter, Published, settle};
use crate::social::types::{Platform, PostResult, PublishRequest};

/// Delay between container creation and publish, allowing Instagram to
/// finish processing the referenced image.
const CONTAINER_PROCESSING_DELAY: Duration = Duration::from_secs(5);

/// Instagram Business Account publisher
pub struct InstagramAdapter {
    client: reqwest::Client,
    graph_base: String,
    publish_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

impl InstagramAdapter {
    pub fn new(client: reqwest::Client, graph_base: impl Into<String>) -> Self {
        Self {
            client,
            graph_base: graph_base.into(),
            publish_delay: CONTAINER_PROCESSING_DELAY,
        }
    }

    /// Override the container processing delay (tests).
    pub fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    async fn try_publish(&self, req: &PublishRequest) -> Result<Published, AdapterError> {
        let ig_user_id = req.page_id.as_deref().ok_or_else(|| {
            AdapterError::Unusable("connection has no Instagram business account id".into())
        })?;

        let image_url = req
            .image_url
            .as_deref()
            .ok_or_else(|| AdapterError::Unusable("no image available for Instagram post".into()))?;

        // Step 1: create the media container.
        let params = [
            ("image_url", image_url),
            ("caption", req.caption.as_str()),
            ("access_token", req.access_token.as_str()),
        ];
        let response = self
            .client
            .post(format!("{}/{}/media", self.graph_base, ig_user_id))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(response).await);
        }

        let container: MediaResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;

        tokio::time::sleep(self.publish_delay).await;

        // Step 2: publish the container.
        let params = [
            ("creation_id", container.id.as_str()),
            ("access_token", req.access_token.as_str()),
        ];
        let response = self
            .client
            .post(format!("{}/{}/media_publish", self.graph_base, ig_user_id))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(graph_api_error(response).await);
        }

        let media: MediaResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;

        Ok(Published {
            post_id: media.id,
            post_url: None,
        })
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(&self, req: PublishRequest) -> PostResult {
        let outcome = self.try_publish(&req).await;
        settle(Platform::Instagram, &req, outcome)
    }
}
