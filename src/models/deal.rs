//! Deal entity model
//!
//! Read-side projection of the marketplace's deals table. One row is loaded
//! per publish trigger and projected into the transient
//! [`DealForSocialPost`](crate::social::types::DealForSocialPost).

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub vendor_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    /// `regular` or `sponti_coupon` (flash deal; captions use urgency framing)
    pub deal_type: String,

    pub original_price: f64,

    pub deal_price: f64,

    pub discount_percentage: i32,

    pub image_url: Option<String>,

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
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
