//! Facebook publish adapter
//!
//! Publishes a deal to a Facebook Page through the Graph API: one call to
//! `/{page_id}/photos` when the deal has an image, or `/{page_id}/feed` as a
//! link post when it doesn't. The claim URL is guaranteed to appear in the
//! caption text; the post URL is derived from the returned post id.

use async_trait::async_trait;
use serde::Deserialize;

use crate::social::platforms::graph_api_error;
use crate::social::platforms::trait_::{AdapterError, PlatformAdapter, Published, settle};
use crate::social::types::{Platform, PostResult, PublishRequest};

/// Facebook Page publisher
pub struct FacebookAdapter {
    client: reqwest::Client,
    graph_base: String,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    id: String,
    /// Page feed story id; present for photo posts
    post_id: Option<String>,
}

impl FacebookAdapter {
    pub fn new(client: reqwest::Client, graph_base: impl Into<String>) -> Self {
        Self {
            client,
            graph_base: graph_base.into(),
        }
    }

    /// Ensure the claim URL appears in the caption, appending it when the
    /// generated caption didn't already include it.
    fn caption_with_claim_url(caption: &str, claim_url: &str) -> String {
        if caption.contains(claim_url) {
            caption.to_string()
        } else {
            format!("{}\n\n👉 {}", caption.trim_end(), claim_url)
        }
    }

    async fn try_publish(&self, req: &PublishRequest) -> Result<Published, AdapterError> {
        let page_id = req
            .page_id
            .as_deref()
            .ok_or_else(|| AdapterError::Unusable("connection has no Facebook page id".into()))?;

        let caption = Self::caption_with_claim_url(&req.caption, &req.claim_url);

        let response = match req.image_url.as_deref() {
            Some(image_url) => {
                let params = [
                    ("url", image_url),
                    ("caption", caption.as_str()),
                    ("access_token", req.access_token.as_str()),
                ];
                self.client
                    .post(format!("{}/{}/photos", self.graph_base, page_id))
                    .form(&params)
                    .send()
                    .await?
            }
            None => {
                let params = [
                    ("message", caption.as_str()),
                    ("link", req.claim_url.as_str()),
                    ("access_token", req.access_token.as_str()),
                ];
                self.client
                    .post(format!("{}/{}/feed", self.graph_base, page_id))
                    .form(&params)
                    .send()
                    .await?
            }
        };

        if !response.status().is_success() {
            return Err(graph_api_error(response).await);
        }

        let photo: PhotoResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;

        let post_id = photo.post_id.unwrap_or(photo.id);
        let post_url = format!("https://www.facebook.com/{}", post_id);

        Ok(Published {
            post_id,
            post_url: Some(post_url),
        })
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(&self, req: PublishRequest) -> PostResult {
        let outcome = self.try_publish(&req).await;
        settle(Platform::Facebook, &req, outcome)
    }
}
