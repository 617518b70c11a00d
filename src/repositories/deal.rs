//! Deal and vendor read-side repository
//!
//! Loads the rows the social pipeline projects into the transient
//! deal-for-social-post view. This repository never writes.

use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{deal, vendor};

/// Repository for deal and vendor lookups
#[derive(Clone)]
pub struct DealRepository {
    db: Arc<DatabaseConnection>,
}

impl DealRepository {
    /// Creates a new DealRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds a deal by its ID
    pub async fn find_deal(&self, id: &Uuid) -> Result<Option<deal::Model>> {
        Ok(deal::Entity::find_by_id(*id).one(&*self.db).await?)
    }

    /// Finds a vendor by its ID
    pub async fn find_vendor(&self, id: &Uuid) -> Result<Option<vendor::Model>> {
        Ok(vendor::Entity::find_by_id(*id).one(&*self.db).await?)
    }
}
