//! Social post log entity model
//!
//! One immutable row per (deal, connection) publish attempt; the audit trail
//! of what was attempted. Rows are created once and never mutated.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "social_posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub deal_id: Uuid,

    pub connection_id: Uuid,

    pub platform: String,

    /// `brand` or `vendor`
    pub account_type: String,

    /// The caption actually sent to the platform
    pub caption: String,

    pub image_url: Option<String>,

    pub claim_url: String,

    /// `posted` or `failed`
    pub status: String,

    pub platform_post_id: Option<String>,

    pub platform_post_url: Option<String>,

    pub error_message: Option<String>,

    /// Null when the attempt failed
    pub posted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deal::Entity",
        from = "Column::DealId",
        to = "super::deal::Column::Id"
    )]
    Deal,
    #[sea_orm(
        belongs_to = "super::social_connection::Entity",
        from = "Column::ConnectionId",
        to = "super::social_connection::Column::Id"
    )]
    SocialConnection,
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl Related<super::social_connection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialConnection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
