//! Migration to create the deals table.
//!
//! The marketplace writes this table when a vendor publishes a deal; the
//! social pipeline reads one row per publish trigger.

use sea_orm_migration::prelude::*;

use crate::m2025_06_10_100000_create_vendors::Vendors;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Deals::Title).text().not_null())
                    .col(ColumnDef::new(Deals::Description).text().null())
                    .col(
                        ColumnDef::new(Deals::DealType)
                            .text()
                            .not_null()
                            .default("regular"),
                    )
                    .col(ColumnDef::new(Deals::OriginalPrice).double().not_null())
                    .col(ColumnDef::new(Deals::DealPrice).double().not_null())
                    .col(
                        ColumnDef::new(Deals::DiscountPercentage)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deals::ImageUrl).text().null())
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deals_vendor_id")
                            .from(Deals::Table, Deals::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Deals {
    Table,
    Id,
    VendorId,
    Title,
    Description,
    DealType,
    OriginalPrice,
    DealPrice,
    DiscountPercentage,
    ImageUrl,
    CreatedAt,
    UpdatedAt,
}
