//! Subscription tier feature gates.
//!
//! The post manager consults this before doing any work: automatic social
//! posting is a paid feature, and a tier without it is a silent no-op, not
//! an error. Unknown tier slugs are treated as not eligible so a billing
//! misconfiguration can never cause surprise posting.

/// Feature flags attached to a subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierFeatures {
    pub social_auto_post: bool,
}

/// Resolve the feature flags for a vendor's tier slug.
pub fn features_for(tier: &str) -> TierFeatures {
    match tier {
        "starter" => TierFeatures {
            social_auto_post: false,
        },
        "growth" | "premium" => TierFeatures {
            social_auto_post: true,
        },
        _ => TierFeatures {
            social_auto_post: false,
        },
    }
}
