//! Vendor entity model
//!
//! Read-side projection of the marketplace's vendors table. The social
//! pipeline reads business identity, location, and subscription tier; it
//! never writes this table.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub business_name: String,

    pub city: String,

    pub state: String,

    pub category: String,

    /// Subscription tier slug; gates automatic social posting
    pub subscription_tier: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deal::Entity")]
    Deal,
    #[sea_orm(has_many = "super::social_connection::Entity")]
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
