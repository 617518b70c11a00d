//! Social post log repository
//!
//! Append-only access to the social_posts table: one row per (deal,
//! connection) publish attempt. Rows are inserted once and never updated.

use anyhow::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{social_connection, social_post};
use crate::social::types::{PostResult, account_type};

/// One publish attempt ready to be written to the log.
pub struct NewPostAttempt<'a> {
    pub deal_id: Uuid,
    pub connection: &'a social_connection::Model,
    /// The caption actually sent to this connection's platform
    pub caption: String,
    pub image_url: Option<String>,
    pub claim_url: String,
    pub result: &'a PostResult,
}

/// Repository for the immutable social post log
#[derive(Clone)]
pub struct PostLogRepository {
    db: Arc<DatabaseConnection>,
}

impl PostLogRepository {
    /// Creates a new PostLogRepository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the connection ids that already have a log row for this deal.
    /// The post manager uses this as the idempotency guard: re-triggering a
    /// deal never re-posts to a connection that was already attempted.
    pub async fn logged_connection_ids(&self, deal_id: &Uuid) -> Result<HashSet<Uuid>> {
        let rows = social_post::Entity::find()
            .filter(social_post::Column::DealId.eq(*deal_id))
            .all(&*self.db)
            .await?;

        Ok(rows.into_iter().map(|row| row.connection_id).collect())
    }

    /// Inserts exactly one log row for a publish attempt.
    pub async fn record_attempt(&self, attempt: NewPostAttempt<'_>) -> Result<social_post::Model> {
        let now = Utc::now();
        let posted_at = attempt.result.success.then_some(now);

        let row = social_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            deal_id: Set(attempt.deal_id),
            connection_id: Set(attempt.connection.id),
            platform: Set(attempt.result.platform.as_str().to_string()),
            account_type: Set(account_type(attempt.connection).to_string()),
            caption: Set(attempt.caption),
            image_url: Set(attempt.image_url),
            claim_url: Set(attempt.claim_url),
            status: Set(if attempt.result.success {
                "posted".to_string()
            } else {
                "failed".to_string()
            }),
            platform_post_id: Set(attempt.result.platform_post_id.clone()),
            platform_post_url: Set(attempt.result.platform_post_url.clone()),
            error_message: Set(attempt.result.error.clone()),
            posted_at: Set(posted_at.map(Into::into)),
            created_at: Set(now.into()),
        };

        Ok(row.insert(&*self.db).await?)
    }

    /// Lists the log rows for a deal, oldest first.
    pub async fn find_by_deal(&self, deal_id: &Uuid) -> Result<Vec<social_post::Model>> {
        Ok(social_post::Entity::find()
            .filter(social_post::Column::DealId.eq(*deal_id))
            .all(&*self.db)
            .await?)
    }
}
