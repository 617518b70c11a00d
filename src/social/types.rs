//! Shared types for the social posting pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{deal, social_connection, vendor};

/// Hard character cap for tweet text, enforced at the adapter boundary.
pub const TWEET_CHAR_LIMIT: usize = 280;

/// The social platforms the pipeline can publish to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Tiktok,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Tiktok => "tiktok",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "tiktok" => Ok(Platform::Tiktok),
            other => Err(UnknownPlatform {
                value: other.to_string(),
            }),
        }
    }
}

/// Error for connection rows carrying a platform tag the pipeline doesn't know.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown platform '{value}'")]
pub struct UnknownPlatform {
    pub value: String,
}

/// Normalized outcome of one publish attempt against one platform.
///
/// Adapters never fail in the `Err` sense; every failure mode is folded into
/// `success: false` plus a human-readable `error`, so one platform's failure
/// can never abort the caller's fan-out.
#[derive(Debug, Clone)]
pub struct PostResult {
    pub platform: Platform,
    pub connection_id: Uuid,
    pub success: bool,
    pub platform_post_id: Option<String>,
    pub platform_post_url: Option<String>,
    pub error: Option<String>,
}

impl PostResult {
    pub fn posted(
        platform: Platform,
        connection_id: Uuid,
        post_id: String,
        post_url: Option<String>,
    ) -> Self {
        Self {
            platform,
            connection_id,
            success: true,
            platform_post_id: Some(post_id),
            platform_post_url: post_url,
            error: None,
        }
    }

    pub fn failed<S: Into<String>>(platform: Platform, connection_id: Uuid, error: S) -> Self {
        Self {
            platform,
            connection_id,
            success: false,
            platform_post_id: None,
            platform_post_url: None,
            error: Some(error.into()),
        }
    }
}

/// Everything an adapter needs to publish one post for one connection.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub connection_id: Uuid,
    pub access_token: String,
    /// Facebook Page ID / Instagram Business Account ID, when applicable
    pub page_id: Option<String>,
    pub caption: String,
    pub image_url: Option<String>,
    pub claim_url: String,
}

/// Snapshot of the vendor fields the pipeline needs.
#[derive(Debug, Clone)]
pub struct VendorSnapshot {
    pub business_name: String,
    pub city: String,
    pub state: String,
    pub category: String,
    pub subscription_tier: String,
}

/// Transient deal + vendor projection, constructed fresh per publish call.
#[derive(Debug, Clone)]
pub struct DealForSocialPost {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deal_type: DealType,
    pub original_price: f64,
    pub deal_price: f64,
    pub discount_percentage: i32,
    pub image_url: Option<String>,
    pub vendor_id: Uuid,
    pub vendor: VendorSnapshot,
}

/// Deal flavor; flash coupons get urgency framing in captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealType {
    Regular,
    SpontiCoupon,
}

impl DealType {
    pub fn is_flash(&self) -> bool {
        matches!(self, DealType::SpontiCoupon)
    }
}

impl DealForSocialPost {
    /// Build the projection from the persisted deal and vendor rows.
    pub fn from_models(deal: &deal::Model, vendor: &vendor::Model) -> Self {
        let deal_type = match deal.deal_type.as_str() {
            "sponti_coupon" => DealType::SpontiCoupon,
            _ => DealType::Regular,
        };
        Self {
            id: deal.id,
            title: deal.title.clone(),
            description: deal.description.clone(),
            deal_type,
            original_price: deal.original_price,
            deal_price: deal.deal_price,
            discount_percentage: deal.discount_percentage,
            image_url: deal.image_url.clone(),
            vendor_id: deal.vendor_id,
            vendor: VendorSnapshot {
                business_name: vendor.business_name.clone(),
                city: vendor.city.clone(),
                state: vendor.state.clone(),
                category: vendor.category.clone(),
                subscription_tier: vendor.subscription_tier.clone(),
            },
        }
    }
}

/// Captions for all four platforms, produced once per deal and shared across
/// every connection in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCaptions {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub tiktok: String,
}

impl PlatformCaptions {
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Instagram => &self.instagram,
            Platform::Twitter => &self.twitter,
            Platform::Tiktok => &self.tiktok,
        }
    }
}

/// Account flavor recorded on every log row.
pub fn account_type(connection: &social_connection::Model) -> &'static str {
    if connection.is_brand_account {
        "brand"
    } else {
        "vendor"
    }
}

/// Truncate to at most `max_chars` characters, ellipsis included, on a char
/// boundary. Returns the input unchanged when it already fits.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push('…');
    truncated
}
