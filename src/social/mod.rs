//! The social auto-posting pipeline.
//!
//! Fan-out publisher for newly created deals: caption generation, credential
//! resolution with refresh-before-expiry, and concurrent per-platform
//! publishing with full per-connection failure isolation.

pub mod captions;
pub mod platforms;
pub mod post_manager;
pub mod tiers;
pub mod token_refresh;
pub mod types;

pub use post_manager::{BatchOutcome, PostManager, PostSummary, SkipReason};
pub use types::{DealForSocialPost, Platform, PlatformCaptions, PostResult, PublishRequest};
