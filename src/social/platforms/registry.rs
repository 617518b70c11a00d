//! Adapter registry
//!
//! Maps platform tags to their publish adapters. The registry is constructed
//! explicitly at the composition root and dependency-injected into the post
//! manager; there is no global instance.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::social::platforms::{
    PlatformAdapter, facebook::FacebookAdapter, instagram::InstagramAdapter,
    tiktok::TikTokAdapter, twitter::TwitterAdapter,
};
use crate::social::types::Platform;

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("no adapter registered for platform '{platform}'")]
    AdapterNotFound { platform: Platform },
}

/// Registry of publish adapters keyed by platform.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Build the production registry with all four platform adapters,
    /// sharing one HTTP client and taking API base URLs from configuration.
    pub fn for_production(client: reqwest::Client, config: &AppConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FacebookAdapter::new(
            client.clone(),
            config.graph_api_base.clone(),
        )));
        registry.register(Arc::new(InstagramAdapter::new(
            client.clone(),
            config.graph_api_base.clone(),
        )));
        registry.register(Arc::new(TwitterAdapter::new(
            client.clone(),
            config.twitter_api_base.clone(),
            config.twitter_upload_base.clone(),
        )));
        registry.register(Arc::new(TikTokAdapter::new(
            client,
            config.tiktok_api_base.clone(),
        )));
        registry
    }

    /// Register an adapter under the platform it reports.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    /// Get the adapter for a platform
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn PlatformAdapter>, RegistryError> {
        self.adapters
            .get(&platform)
            .cloned()
            .ok_or(RegistryError::AdapterNotFound { platform })
    }
}
