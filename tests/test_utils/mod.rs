//! Test utilities for database testing.
//!
//! Provides an in-memory SQLite database with all migrations applied plus
//! fixture helpers for vendors, deals, and social connections.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set, Statement};
use std::sync::Arc;
use uuid::Uuid;

use dealcast::crypto::TokenCipher;
use dealcast::models::{deal, social_connection, vendor};
use migration::{Migrator, MigratorTrait};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<Arc<DatabaseConnection>> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // SQLite does not enforce our Postgres foreign key semantics; disable FK
    // checks so fixtures can be inserted in any order.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(Arc::new(db))
}

/// Cipher with a fixed key for tests.
pub fn test_cipher() -> TokenCipher {
    TokenCipher::new(vec![7u8; 32]).expect("valid test key")
}

/// Inserts a vendor with the given subscription tier.
#[allow(dead_code)]
pub async fn insert_vendor(db: &DatabaseConnection, tier: &str) -> Result<vendor::Model> {
    let now = Utc::now();
    let row = vendor::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_name: Set("Joe's Pizza".to_string()),
        city: Set("Miami".to_string()),
        state: Set("FL".to_string()),
        category: Set("Restaurants".to_string()),
        subscription_tier: Set(tier.to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Ok(row.insert(db).await?)
}

/// Inserts a flash deal for the vendor.
#[allow(dead_code)]
pub async fn insert_deal(
    db: &DatabaseConnection,
    vendor_id: Uuid,
    image_url: Option<&str>,
) -> Result<deal::Model> {
    let now = Utc::now();
    let row = deal::ActiveModel {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor_id),
        title: Set("Large 2-topping pizza".to_string()),
        description: Set(Some("Any two toppings, dine-in or takeout".to_string())),
        deal_type: Set("sponti_coupon".to_string()),
        original_price: Set(40.0),
        deal_price: Set(20.0),
        discount_percentage: Set(50),
        image_url: Set(image_url.map(str::to_string)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Ok(row.insert(db).await?)
}

/// Fixture description for a social connection.
#[allow(dead_code)]
pub struct ConnectionSpec {
    pub platform: String,
    pub vendor_id: Option<Uuid>,
    pub is_brand_account: bool,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub platform_page_id: Option<String>,
    pub is_active: bool,
}

impl Default for ConnectionSpec {
    fn default() -> Self {
        Self {
            platform: "facebook".to_string(),
            vendor_id: None,
            is_brand_account: false,
            access_token: "plain-access-token".to_string(),
            refresh_token: None,
            token_expires_at: None,
            platform_page_id: Some("page-1".to_string()),
            is_active: true,
        }
    }
}

/// Inserts a social connection, encrypting its tokens with the given cipher.
#[allow(dead_code)]
pub async fn insert_connection(
    db: &DatabaseConnection,
    cipher: &TokenCipher,
    spec: ConnectionSpec,
) -> Result<social_connection::Model> {
    let now = Utc::now();
    let access_ciphertext = cipher.encrypt(&spec.access_token)?;
    let refresh_ciphertext = spec
        .refresh_token
        .as_deref()
        .map(|t| cipher.encrypt(t))
        .transpose()?;

    let row = social_connection::ActiveModel {
        id: Set(Uuid::new_v4()),
        platform: Set(spec.platform.clone()),
        vendor_id: Set(spec.vendor_id),
        is_brand_account: Set(spec.is_brand_account),
        access_token_ciphertext: Set(access_ciphertext),
        refresh_token_ciphertext: Set(refresh_ciphertext),
        token_expires_at: Set(spec.token_expires_at.map(Into::into)),
        platform_user_id: Set(format!("{}-user", spec.platform)),
        platform_page_id: Set(spec.platform_page_id),
        account_name: Set(Some("Test Account".to_string())),
        username: Set(Some("testaccount".to_string())),
        avatar_url: Set(None),
        is_active: Set(spec.is_active),
        last_posted_at: Set(None),
        last_error: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Ok(row.insert(db).await?)
}
