//! # Post Manager
//!
//! The pipeline's entry point. Loads the deal and vendor, gates on the
//! vendor's subscription tier, collects eligible connections, generates
//! captions once for the whole batch, dispatches every platform post
//! concurrently with per-connection isolation, and writes exactly one log
//! row plus one connection-status update per attempt.
//!
//! Platform failures are recorded, never propagated: the returned
//! [`BatchOutcome`] carries success/failure counts so callers and tests can
//! assert on outcomes without scraping logs. Only infrastructure faults
//! (database errors) surface as `Err`.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use metrics::counter;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::models::social_connection;
use crate::repositories::{ConnectionRepository, DealRepository, PostLogRepository};
use crate::repositories::post_log::NewPostAttempt;
use crate::social::captions::CaptionGenerator;
use crate::social::platforms::AdapterRegistry;
use crate::social::tiers;
use crate::social::token_refresh::TokenRefreshService;
use crate::social::types::{
    DealForSocialPost, Platform, PlatformCaptions, PostResult, PublishRequest,
};

/// Why a batch ended without any publish attempt. All of these are
/// successful no-ops, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    DealNotFound,
    VendorNotFound,
    TierNotEligible,
    NoConnections,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::DealNotFound => "deal not found",
            SkipReason::VendorNotFound => "vendor not found",
            SkipReason::TierNotEligible => "subscription tier does not include social auto-posting",
            SkipReason::NoConnections => "no active social connections",
        };
        f.write_str(text)
    }
}

/// Success/failure counts for a completed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSummary {
    pub attempted: usize,
    pub posted: usize,
    pub failed: usize,
}

/// Outcome of one `post_deal_to_social` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Skipped(SkipReason),
    Completed(PostSummary),
}

/// Orchestrates the social posting fan-out for newly created deals.
pub struct PostManager {
    deals: Arc<DealRepository>,
    connections: Arc<ConnectionRepository>,
    post_log: Arc<PostLogRepository>,
    captions: Arc<CaptionGenerator>,
    token_refresh: Arc<TokenRefreshService>,
    adapters: Arc<AdapterRegistry>,
    app_url: String,
}

impl PostManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        deals: Arc<DealRepository>,
        connections: Arc<ConnectionRepository>,
        post_log: Arc<PostLogRepository>,
        captions: Arc<CaptionGenerator>,
        token_refresh: Arc<TokenRefreshService>,
        adapters: Arc<AdapterRegistry>,
        app_url: String,
    ) -> Self {
        Self {
            deals,
            connections,
            post_log,
            captions,
            token_refresh,
            adapters,
            app_url,
        }
    }

    /// Publish a deal to every eligible social connection.
    ///
    /// Fire-and-forget from the trigger's point of view: platform failures
    /// are recorded per connection and never surface as `Err`. `Err` means
    /// an infrastructure fault (database unavailable), nothing else.
    #[instrument(skip(self), fields(deal_id = %deal_id, vendor_id = %vendor_id))]
    pub async fn post_deal_to_social(
        &self,
        deal_id: Uuid,
        vendor_id: Uuid,
    ) -> Result<BatchOutcome> {
        let Some(deal_row) = self.deals.find_deal(&deal_id).await? else {
            info!("Deal not found, skipping social post");
            return Ok(BatchOutcome::Skipped(SkipReason::DealNotFound));
        };
        let Some(vendor_row) = self.deals.find_vendor(&vendor_id).await? else {
            info!("Vendor not found, skipping social post");
            return Ok(BatchOutcome::Skipped(SkipReason::VendorNotFound));
        };

        let deal = DealForSocialPost::from_models(&deal_row, &vendor_row);

        // Billing gate: a tier without auto-posting is a silent no-op.
        if !tiers::features_for(&deal.vendor.subscription_tier).social_auto_post {
            info!(
                tier = %deal.vendor.subscription_tier,
                "Subscription tier does not include social auto-posting"
            );
            return Ok(BatchOutcome::Skipped(SkipReason::TierNotEligible));
        }

        let eligible = self.connections.find_eligible(&vendor_id).await?;
        if eligible.is_empty() {
            info!("No active social connections for vendor");
            return Ok(BatchOutcome::Skipped(SkipReason::NoConnections));
        }

        // Idempotency guard: connections already logged for this deal are no
        // longer considered, so a double trigger cannot double-post.
        let already_logged = self.post_log.logged_connection_ids(&deal_id).await?;
        let mut batch: Vec<(social_connection::Model, Platform)> = Vec::new();
        for connection in eligible {
            if already_logged.contains(&connection.id) {
                info!(
                    connection_id = %connection.id,
                    "Connection already has a post for this deal, skipping"
                );
                continue;
            }
            match connection.platform.parse::<Platform>() {
                Ok(platform) => batch.push((connection, platform)),
                Err(err) => {
                    warn!(
                        connection_id = %connection.id,
                        error = %err,
                        "Connection has unknown platform, skipping"
                    );
                    let _ = self
                        .connections
                        .record_error(&connection.id, &err.to_string())
                        .await;
                }
            }
        }

        if batch.is_empty() {
            return Ok(BatchOutcome::Completed(PostSummary::default()));
        }

        // One caption generation call, shared by every connection.
        let captions = Arc::new(self.captions.generate(&deal).await);
        let claim_url = format!(
            "{}/deals/{}",
            self.app_url.trim_end_matches('/'),
            deal.id
        );

        // Fan out: all connections at once, then wait for every attempt to
        // settle. The adapters never return errors, and the join below is
        // the second line of defense — a panicked task becomes a failed
        // result instead of tearing down the batch.
        let mut handles = Vec::with_capacity(batch.len());
        for (connection, platform) in &batch {
            handles.push(tokio::spawn(Self::dispatch(
                connection.clone(),
                *platform,
                Arc::clone(&captions),
                claim_url.clone(),
                deal.image_url.clone(),
                Arc::clone(&self.token_refresh),
                Arc::clone(&self.adapters),
            )));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            let (connection, platform) = &batch[index];
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    error!(
                        connection_id = %connection.id,
                        error = %join_err,
                        "Publish task aborted"
                    );
                    PostResult::failed(
                        *platform,
                        connection.id,
                        format!("publish task aborted: {join_err}"),
                    )
                }
            };
            results.push(result);
        }

        // Persistence phase, in original connection order: one immutable log
        // row and one connection-status update per attempt.
        let now = Utc::now();
        let mut summary = PostSummary {
            attempted: results.len(),
            ..Default::default()
        };
        for ((connection, platform), result) in batch.iter().zip(&results) {
            if result.success {
                summary.posted += 1;
            } else {
                summary.failed += 1;
            }

            let attempt = NewPostAttempt {
                deal_id: deal.id,
                connection,
                caption: captions.for_platform(*platform).to_string(),
                image_url: deal.image_url.clone(),
                claim_url: claim_url.clone(),
                result,
            };
            if let Err(err) = self.post_log.record_attempt(attempt).await {
                error!(
                    connection_id = %connection.id,
                    error = %err,
                    "Failed to write post log row"
                );
            }
            if let Err(err) = self
                .connections
                .apply_post_outcome(&connection.id, result.success, result.error.as_deref(), now)
                .await
            {
                error!(
                    connection_id = %connection.id,
                    error = %err,
                    "Failed to update connection after post attempt"
                );
            }

            let status = if result.success { "posted" } else { "failed" };
            counter!(
                "social_post_attempts_total",
                "platform" => platform.as_str(),
                "status" => status
            )
            .increment(1);
        }

        info!(
            attempted = summary.attempted,
            posted = summary.posted,
            failed = summary.failed,
            "Social post batch completed"
        );

        Ok(BatchOutcome::Completed(summary))
    }

    /// Per-connection pipeline: resolve a valid token, then hand off to the
    /// platform's adapter. A token failure synthesizes a failed result
    /// without any platform call.
    async fn dispatch(
        connection: social_connection::Model,
        platform: Platform,
        captions: Arc<PlatformCaptions>,
        claim_url: String,
        image_url: Option<String>,
        token_refresh: Arc<TokenRefreshService>,
        adapters: Arc<AdapterRegistry>,
    ) -> PostResult {
        let Some(access_token) = token_refresh.ensure_valid_token(&connection).await else {
            return PostResult::failed(
                platform,
                connection.id,
                "could not obtain a valid access token; connection skipped",
            );
        };

        let adapter = match adapters.get(platform) {
            Ok(adapter) => adapter,
            Err(err) => return PostResult::failed(platform, connection.id, err.to_string()),
        };

        let request = PublishRequest {
            connection_id: connection.id,
            access_token,
            page_id: connection.platform_page_id.clone(),
            caption: captions.for_platform(platform).to_string(),
            image_url,
            claim_url,
        };

        adapter.publish(request).await
    }
}
