//! Social connection entity model
//!
//! A stored credential binding to one external platform account. Token
//! columns hold AES-256-GCM ciphertext in the `nonce:tag:ciphertext` hex
//! format; decryption happens only in memory during a publish or refresh
//! call. Rows with a null vendor_id are platform-wide brand accounts.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "social_connections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// One of `facebook`, `instagram`, `twitter`, `tiktok`
    pub platform: String,

    /// Owning vendor; None means a platform-wide brand account
    pub vendor_id: Option<Uuid>,

    pub is_brand_account: bool,

    /// Encrypted access token (never plaintext)
    pub access_token_ciphertext: String,

    /// Encrypted refresh token, when the platform issues one
    pub refresh_token_ciphertext: Option<String>,

    /// Absent means the token is long-lived / non-expiring
    pub token_expires_at: Option<DateTimeWithTimeZone>,

    pub platform_user_id: String,

    /// Facebook Page ID / Instagram Business Account ID
    pub platform_page_id: Option<String>,

    pub account_name: Option<String>,

    pub username: Option<String>,

    pub avatar_url: Option<String>,

    /// Soft-disable; inactive connections are never considered for posting
    pub is_active: bool,

    pub last_posted_at: Option<DateTimeWithTimeZone>,

    /// Free text, overwritten on every attempt
    pub last_error: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
    #[sea_orm(has_many = "super::social_post::Entity")]
    SocialPost,
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl Related<super::social_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialPost.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
