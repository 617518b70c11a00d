//! Migration to create the vendors table.
//!
//! The marketplace writes this table; dealcast only reads the fields the
//! social pipeline needs (business identity, location, subscription tier).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vendors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vendors::BusinessName).text().not_null())
                    .col(ColumnDef::new(Vendors::City).text().not_null())
                    .col(ColumnDef::new(Vendors::State).text().not_null())
                    .col(ColumnDef::new(Vendors::Category).text().not_null())
                    .col(
                        ColumnDef::new(Vendors::SubscriptionTier)
                            .text()
                            .not_null()
                            .default("starter"),
                    )
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Vendors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vendors {
    Table,
    Id,
    BusinessName,
    City,
    State,
    Category,
    SubscriptionTier,
    CreatedAt,
    UpdatedAt,
}
