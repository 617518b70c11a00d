//! # Token Refresh Service
//!
//! On-demand token validation for publish batches. Given a connection, the
//! service decrypts the stored access token, decides whether it needs
//! refreshing (proximity to expiry), performs the platform-specific refresh
//! flow, and persists the re-encrypted result. Every failure is recorded on
//! the connection and surfaces as `None` — the caller skips that connection
//! for the round; the batch never crashes on a refresh failure.

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::models::social_connection;
use crate::repositories::ConnectionRepository;
use crate::social::types::Platform;

/// Tokens expiring within this buffer are refreshed ahead of use.
pub const REFRESH_BUFFER_SECONDS: i64 = 5 * 60;

/// Meta app credentials for the Facebook/Instagram long-lived token exchange.
#[derive(Debug, Clone)]
pub struct MetaAppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

/// OAuth2 client credentials for refresh-token grants (Twitter, TikTok).
#[derive(Debug, Clone)]
pub struct OAuthClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Internal refresh error taxonomy; every variant is recorded on the
/// connection and converted to a skipped round.
#[derive(Debug, Error)]
enum RefreshError {
    #[error("{0} app credentials not configured")]
    MissingAppCredentials(&'static str),
    #[error("no refresh token available")]
    MissingRefreshToken,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("token refresh failed: HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed token response: {0}")]
    Malformed(String),
}

/// The platform's answer to a refresh request.
#[derive(Debug)]
struct RefreshedTokens {
    access_token: String,
    /// Present when the platform rotated the refresh token
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Decide whether a token needs refreshing. No expiry means long-lived:
/// never refreshed. Otherwise refresh once the expiry is inside the
/// five-minute buffer.
pub fn needs_refresh(token_expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match token_expires_at {
        None => false,
        Some(expires_at) => expires_at - now <= Duration::seconds(REFRESH_BUFFER_SECONDS),
    }
}

/// On-demand token refresh service
pub struct TokenRefreshService {
    client: reqwest::Client,
    connections: Arc<ConnectionRepository>,
    meta: Option<MetaAppCredentials>,
    twitter: Option<OAuthClientCredentials>,
    tiktok: Option<OAuthClientCredentials>,
    graph_api_base: String,
    twitter_api_base: String,
    tiktok_api_base: String,
}

impl TokenRefreshService {
    /// Build the service from configuration. Missing platform app
    /// credentials are not an error here — they become recorded refresh
    /// failures for the connections that need them.
    pub fn from_config(
        client: reqwest::Client,
        connections: Arc<ConnectionRepository>,
        config: &AppConfig,
    ) -> Self {
        let meta = match (config.meta_app_id.clone(), config.meta_app_secret.clone()) {
            (Some(app_id), Some(app_secret)) => Some(MetaAppCredentials { app_id, app_secret }),
            _ => None,
        };
        let twitter = match (
            config.twitter_client_id.clone(),
            config.twitter_client_secret.clone(),
        ) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        let tiktok = match (
            config.tiktok_client_key.clone(),
            config.tiktok_client_secret.clone(),
        ) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClientCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Self {
            client,
            connections,
            meta,
            twitter,
            tiktok,
            graph_api_base: config.graph_api_base.clone(),
            twitter_api_base: config.twitter_api_base.clone(),
            tiktok_api_base: config.tiktok_api_base.clone(),
        }
    }

    /// Resolve a usable plaintext access token for a connection.
    ///
    /// Returns `None` when the connection cannot be used this round; the
    /// reason is recorded as `last_error` on the connection. The caller must
    /// skip the connection, never abort the batch.
    pub async fn ensure_valid_token(
        &self,
        connection: &social_connection::Model,
    ) -> Option<String> {
        let (access_token, refresh_token) = match self.connections.decrypt_tokens(connection).await
        {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!(
                    connection_id = %connection.id,
                    platform = %connection.platform,
                    error = %err,
                    "Token decryption failed, skipping connection"
                );
                let _ = self
                    .connections
                    .record_error(&connection.id, &err.to_string())
                    .await;
                return None;
            }
        };

        let now = Utc::now();
        let expires_at = connection
            .token_expires_at
            .map(|dt| dt.with_timezone(&Utc));

        if !needs_refresh(expires_at, now) {
            return Some(access_token);
        }

        debug!(
            connection_id = %connection.id,
            platform = %connection.platform,
            expires_at = ?expires_at,
            "Token expired or near expiry, refreshing"
        );

        let platform: Platform = match connection.platform.parse() {
            Ok(platform) => platform,
            Err(err) => {
                let _ = self
                    .connections
                    .record_error(&connection.id, &err.to_string())
                    .await;
                return None;
            }
        };

        let outcome = match platform {
            Platform::Facebook | Platform::Instagram => self.refresh_meta(&access_token).await,
            Platform::Twitter => self.refresh_twitter(refresh_token.as_deref()).await,
            Platform::Tiktok => self.refresh_tiktok(refresh_token.as_deref()).await,
        };

        match outcome {
            Ok(refreshed) => {
                if let Err(err) = self
                    .connections
                    .store_refreshed_tokens(
                        &connection.id,
                        &refreshed.access_token,
                        refreshed.refresh_token.as_deref(),
                        refreshed.expires_at,
                    )
                    .await
                {
                    warn!(
                        connection_id = %connection.id,
                        error = %err,
                        "Failed to persist refreshed tokens"
                    );
                    let _ = self
                        .connections
                        .record_error(&connection.id, &format!("token persistence failed: {err}"))
                        .await;
                    return None;
                }

                info!(
                    connection_id = %connection.id,
                    platform = %platform,
                    "Refreshed access token"
                );
                counter!("token_refresh_success_total", "platform" => platform.as_str())
                    .increment(1);
                Some(refreshed.access_token)
            }
            Err(err) => {
                warn!(
                    connection_id = %connection.id,
                    platform = %platform,
                    error = %err,
                    "Token refresh failed, skipping connection"
                );
                counter!("token_refresh_failure_total", "platform" => platform.as_str())
                    .increment(1);
                let _ = self
                    .connections
                    .record_error(&connection.id, &err.to_string())
                    .await;
                None
            }
        }
    }

    /// Facebook/Instagram: exchange the current token for a long-lived one.
    /// No refresh-token concept; the exchange re-derives from the access
    /// token itself.
    async fn refresh_meta(&self, access_token: &str) -> Result<RefreshedTokens, RefreshError> {
        let creds = self
            .meta
            .as_ref()
            .ok_or(RefreshError::MissingAppCredentials("Meta"))?;

        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.graph_api_base))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", creds.app_id.as_str()),
                ("client_secret", creds.app_secret.as_str()),
                ("fb_exchange_token", access_token),
            ])
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    /// Twitter: OAuth2 refresh-token grant. The platform may rotate the
    /// refresh token; the rotated value replaces the stored one.
    async fn refresh_twitter(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshedTokens, RefreshError> {
        let creds = self
            .twitter
            .as_ref()
            .ok_or(RefreshError::MissingAppCredentials("Twitter"))?;
        let refresh_token = refresh_token.ok_or(RefreshError::MissingRefreshToken)?;

        let response = self
            .client
            .post(format!("{}/2/oauth2/token", self.twitter_api_base))
            .basic_auth(&creds.client_id, Some(&creds.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", creds.client_id.as_str()),
            ])
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    /// TikTok: OAuth2 refresh-token grant against the open API.
    async fn refresh_tiktok(
        &self,
        refresh_token: Option<&str>,
    ) -> Result<RefreshedTokens, RefreshError> {
        let creds = self
            .tiktok
            .as_ref()
            .ok_or(RefreshError::MissingAppCredentials("TikTok"))?;
        let refresh_token = refresh_token.ok_or(RefreshError::MissingRefreshToken)?;

        let response = self
            .client
            .post(format!("{}/v2/oauth/token/", self.tiktok_api_base))
            .form(&[
                ("client_key", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    async fn parse_token_response(
        response: reqwest::Response,
    ) -> Result<RefreshedTokens, RefreshError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RefreshError::Api { status, message });
        }

        let payload: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;

        let expires_at = payload
            .expires_in
            .map(|seconds| Utc::now() + Duration::seconds(seconds));

        Ok(RefreshedTokens {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at,
        })
    }
}
