//! Twitter/X publish adapter
//!
//! Two-step flow: download the deal image and upload it base64-encoded via
//! the legacy v1.1 media endpoint (best-effort — any media failure degrades
//! to a text-only tweet), then create the tweet through the v2 API. The
//! final text is hard-capped at 280 characters with the claim link always
//! intact at the end.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::social::platforms::trait_::{AdapterError, PlatformAdapter, Published, settle};
use crate::social::types::{
    Platform, PostResult, PublishRequest, TWEET_CHAR_LIMIT, truncate_with_ellipsis,
};

/// Twitter/X publisher
pub struct TwitterAdapter {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// Build the final tweet text: caption plus claim link, capped at 280
/// characters. The caption is what gets truncated; the link always survives
/// intact at the end.
pub(crate) fn compose_tweet_text(caption: &str, claim_url: &str) -> String {
    let caption = caption.trim();
    if caption.contains(claim_url) && caption.chars().count() <= TWEET_CHAR_LIMIT {
        return caption.to_string();
    }

    let suffix = format!("\n\n{}", claim_url);
    let budget = TWEET_CHAR_LIMIT.saturating_sub(suffix.chars().count());
    let body = caption.replace(claim_url, "");
    let body = truncate_with_ellipsis(body.trim(), budget);
    format!("{}{}", body, suffix)
}

impl TwitterAdapter {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            upload_base: upload_base.into(),
        }
    }

    /// Download the image and upload it as base64 media. Best-effort: any
    /// failure returns None and the tweet goes out text-only.
    async fn upload_media(&self, access_token: &str, image_url: &str) -> Option<String> {
        let result: Result<String, AdapterError> = async {
            let image = self.client.get(image_url).send().await?;
            if !image.status().is_success() {
                return Err(AdapterError::Api {
                    status: image.status().as_u16(),
                    message: "image download failed".to_string(),
                });
            }
            let bytes = image.bytes().await?;
            let media_data = BASE64.encode(&bytes);

            let response = self
                .client
                .post(format!("{}/1.1/media/upload.json", self.upload_base))
                .bearer_auth(access_token)
                .form(&[("media_data", media_data.as_str())])
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(AdapterError::Api { status, message });
            }

            let upload: MediaUploadResponse = response
                .json()
                .await
                .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
            Ok(upload.media_id_string)
        }
        .await;

        match result {
            Ok(media_id) => Some(media_id),
            Err(err) => {
                warn!(error = %err, "Twitter media upload failed, posting text-only tweet");
                None
            }
        }
    }

    async fn try_publish(&self, req: &PublishRequest) -> Result<Published, AdapterError> {
        let media_id = match req.image_url.as_deref() {
            Some(image_url) => self.upload_media(&req.access_token, image_url).await,
            None => None,
        };

        let text = compose_tweet_text(&req.caption, &req.claim_url);

        let mut body = json!({ "text": text });
        if let Some(media_id) = media_id {
            body["media"] = json!({ "media_ids": [media_id] });
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&req.access_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("detail")
                        .and_then(|d| d.as_str())
                        .map(str::to_string)
                        .or_else(|| {
                            v.get("errors")?
                                .get(0)?
                                .get("message")?
                                .as_str()
                                .map(str::to_string)
                        })
                })
                .unwrap_or(body);
            return Err(AdapterError::Api { status, message });
        }

        let tweet: TweetResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;

        let post_url = format!("https://twitter.com/i/web/status/{}", tweet.data.id);

        Ok(Published {
            post_id: tweet.data.id,
            post_url: Some(post_url),
        })
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&self, req: PublishRequest) -> PostResult {
        let outcome = self.try_publish(&req).await;
        settle(Platform::Twitter, &req, outcome)
    }
}
