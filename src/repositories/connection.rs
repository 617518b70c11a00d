//! Social connection repository
//!
//! Encapsulates SeaORM operations for the social_connections table. The
//! repository owns the token cipher: plaintext tokens cross this boundary
//! only as transient function arguments and return values, never as stored
//! state.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::crypto::TokenCipher;
use crate::models::social_connection::{self, Entity as SocialConnection};

/// Repository for social connection database operations
#[derive(Clone)]
pub struct ConnectionRepository {
    db: Arc<DatabaseConnection>,
    cipher: Arc<TokenCipher>,
}

impl ConnectionRepository {
    /// Creates a new ConnectionRepository instance
    pub fn new(db: Arc<DatabaseConnection>, cipher: Arc<TokenCipher>) -> Self {
        Self { db, cipher }
    }

    /// Retrieves a connection by its ID
    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<social_connection::Model>> {
        Ok(SocialConnection::find_by_id(*id).one(&*self.db).await?)
    }

    /// Lists the active connections eligible for a vendor's deal: the
    /// vendor's own connections plus platform-wide brand accounts, in
    /// creation order.
    pub async fn find_eligible(&self, vendor_id: &Uuid) -> Result<Vec<social_connection::Model>> {
        Ok(SocialConnection::find()
            .filter(social_connection::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(social_connection::Column::VendorId.eq(*vendor_id))
                    .add(social_connection::Column::IsBrandAccount.eq(true)),
            )
            .order_by_asc(social_connection::Column::CreatedAt)
            .order_by_asc(social_connection::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Decrypts the stored tokens for a connection.
    ///
    /// The access token is required; the refresh token is decrypted only
    /// when present.
    pub async fn decrypt_tokens(
        &self,
        connection: &social_connection::Model,
    ) -> Result<(String, Option<String>)> {
        let access_token = self
            .cipher
            .decrypt(&connection.access_token_ciphertext)
            .map_err(|e| {
                tracing::error!(
                    connection_id = %connection.id,
                    platform = %connection.platform,
                    "Access token decryption failed"
                );
                anyhow!("Token decryption failed: {}", e)
            })?;

        let refresh_token = connection
            .refresh_token_ciphertext
            .as_deref()
            .map(|ct| self.cipher.decrypt(ct))
            .transpose()
            .map_err(|e| {
                tracing::error!(
                    connection_id = %connection.id,
                    platform = %connection.platform,
                    "Refresh token decryption failed"
                );
                anyhow!("Token decryption failed: {}", e)
            })?;

        Ok((access_token, refresh_token))
    }

    /// Persists freshly refreshed tokens: re-encrypts the access token (and
    /// the refresh token, when the platform rotated it), stores the new
    /// expiry, and clears any recorded error.
    pub async fn store_refreshed_tokens(
        &self,
        id: &Uuid,
        access_token: &str,
        rotated_refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<social_connection::Model> {
        let existing = SocialConnection::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Connection '{}' not found", id))?;

        let access_ciphertext = self
            .cipher
            .encrypt(access_token)
            .map_err(|e| anyhow!("Token encryption failed: {}", e))?;

        let mut model: social_connection::ActiveModel = existing.into();
        model.access_token_ciphertext = Set(access_ciphertext);
        if let Some(refresh_token) = rotated_refresh_token {
            let refresh_ciphertext = self
                .cipher
                .encrypt(refresh_token)
                .map_err(|e| anyhow!("Token encryption failed: {}", e))?;
            model.refresh_token_ciphertext = Set(Some(refresh_ciphertext));
        }
        model.token_expires_at = Set(expires_at.map(Into::into));
        model.last_error = Set(None);
        model.updated_at = Set(Utc::now().into());

        Ok(model.update(&*self.db).await?)
    }

    /// Records a descriptive error on the connection (refresh failures,
    /// decryption failures). Overwrites any previous error.
    pub async fn record_error(&self, id: &Uuid, message: &str) -> Result<()> {
        let existing = SocialConnection::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Connection '{}' not found", id))?;

        let mut model: social_connection::ActiveModel = existing.into();
        model.last_error = Set(Some(message.to_string()));
        model.updated_at = Set(Utc::now().into());
        model.update(&*self.db).await?;

        Ok(())
    }

    /// Updates the connection's operational state after a publish attempt:
    /// success sets `last_posted_at` and clears the error; failure records
    /// the error text.
    pub async fn apply_post_outcome(
        &self,
        id: &Uuid,
        success: bool,
        error: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let existing = SocialConnection::find_by_id(*id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| anyhow!("Connection '{}' not found", id))?;

        let mut model: social_connection::ActiveModel = existing.into();
        if success {
            model.last_posted_at = Set(Some(now.into()));
            model.last_error = Set(None);
        } else {
            model.last_error = Set(Some(
                error.unwrap_or("publish attempt failed").to_string(),
            ));
        }
        model.updated_at = Set(now.into());
        model.update(&*self.db).await?;

        Ok(())
    }
}
