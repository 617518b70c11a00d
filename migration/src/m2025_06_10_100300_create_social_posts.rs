//! Migration to create the social_posts table.
//!
//! One immutable row per (deal, connection) publish attempt. The unique
//! index on (deal_id, connection_id) is the idempotency guard: re-triggering
//! a deal cannot produce duplicate posts for the same connection.

use sea_orm_migration::prelude::*;

use crate::m2025_06_10_100100_create_deals::Deals;
use crate::m2025_06_10_100200_create_social_connections::SocialConnections;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SocialPosts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialPosts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SocialPosts::DealId).uuid().not_null())
                    .col(ColumnDef::new(SocialPosts::ConnectionId).uuid().not_null())
                    .col(ColumnDef::new(SocialPosts::Platform).text().not_null())
                    .col(ColumnDef::new(SocialPosts::AccountType).text().not_null())
                    .col(ColumnDef::new(SocialPosts::Caption).text().not_null())
                    .col(ColumnDef::new(SocialPosts::ImageUrl).text().null())
                    .col(ColumnDef::new(SocialPosts::ClaimUrl).text().not_null())
                    .col(ColumnDef::new(SocialPosts::Status).text().not_null())
                    .col(ColumnDef::new(SocialPosts::PlatformPostId).text().null())
                    .col(ColumnDef::new(SocialPosts::PlatformPostUrl).text().null())
                    .col(ColumnDef::new(SocialPosts::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(SocialPosts::PostedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialPosts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_posts_deal_id")
                            .from(SocialPosts::Table, SocialPosts::DealId)
                            .to(Deals::Table, Deals::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_posts_connection_id")
                            .from(SocialPosts::Table, SocialPosts::ConnectionId)
                            .to(SocialConnections::Table, SocialConnections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx_social_posts_deal_connection")
                    .table(SocialPosts::Table)
                    .col(SocialPosts::DealId)
                    .col(SocialPosts::ConnectionId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialPosts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SocialPosts {
    Table,
    Id,
    DealId,
    ConnectionId,
    Platform,
    AccountType,
    Caption,
    ImageUrl,
    ClaimUrl,
    Status,
    PlatformPostId,
    PlatformPostUrl,
    ErrorMessage,
    PostedAt,
    CreatedAt,
}
