//! TikTok publish adapter
//!
//! Single call against the Content Posting API's direct-post photo flow.
//! TikTok requires an image: when the deal has none the adapter fails fast
//! with a descriptive error and makes no network call. The title field is
//! capped at 150 characters.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::social::platforms::trait_::{AdapterError, PlatformAdapter, Published, settle};
use crate::social::types::{Platform, PostResult, PublishRequest};

const MAX_TITLE_CHARS: usize = 150;

/// TikTok photo-mode publisher
pub struct TikTokAdapter {
    client: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ContentInitResponse {
    data: Option<ContentInitData>,
    error: Option<TikTokError>,
}

#[derive(Debug, Deserialize)]
struct ContentInitData {
    publish_id: String,
}

#[derive(Debug, Deserialize)]
struct TikTokError {
    code: String,
    message: Option<String>,
}

impl TikTokAdapter {
    pub fn new(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    async fn try_publish(&self, req: &PublishRequest) -> Result<Published, AdapterError> {
        let image_url = req.image_url.as_deref().ok_or_else(|| {
            AdapterError::Unusable("no image available for TikTok photo post".into())
        })?;

        let title: String = req.caption.chars().take(MAX_TITLE_CHARS).collect();

        let body = json!({
            "post_info": {
                "title": title,
                "privacy_level": "PUBLIC_TO_EVERYONE",
            },
            "source_info": {
                "source": "PULL_FROM_URL",
                "photo_cover_index": 0,
                "photo_images": [image_url],
            },
            "post_mode": "DIRECT_POST",
            "media_type": "PHOTO",
        });

        let response = self
            .client
            .post(format!("{}/v2/post/publish/content/init/", self.api_base))
            .bearer_auth(&req.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let payload: ContentInitResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;

        // TikTok reports failures inside the body even on 200 responses.
        if let Some(error) = payload.error
            && error.code != "ok"
        {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: error.message.unwrap_or(error.code),
            });
        }

        if !status.is_success() {
            return Err(AdapterError::Api {
                status: status.as_u16(),
                message: "TikTok content init failed".to_string(),
            });
        }

        let data = payload
            .data
            .ok_or_else(|| AdapterError::MalformedResponse("missing publish id".to_string()))?;

        Ok(Published {
            post_id: data.publish_id,
            post_url: None,
        })
    }
}

#[async_trait]
impl PlatformAdapter for TikTokAdapter {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    async fn publish(&self, req: PublishRequest) -> PostResult {
        let outcome = self.try_publish(&req).await;
        settle(Platform::Tiktok, &req, outcome)
    }
}
