//! Migration to create the social_connections table.
//!
//! Stores per-platform OAuth credential bindings. Token columns hold
//! AES-256-GCM ciphertext only; plaintext tokens never reach the database.

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
                    .table(SocialConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocialConnections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SocialConnections::Platform).text().not_null())
                    .col(ColumnDef::new(SocialConnections::VendorId).uuid().null())
                    .col(
                        ColumnDef::new(SocialConnections::IsBrandAccount)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::AccessTokenCiphertext)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::RefreshTokenCiphertext)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::PlatformUserId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::PlatformPageId)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(SocialConnections::AccountName).text().null())
                    .col(ColumnDef::new(SocialConnections::Username).text().null())
                    .col(ColumnDef::new(SocialConnections::AvatarUrl).text().null())
                    .col(
                        ColumnDef::new(SocialConnections::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::LastPostedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SocialConnections::LastError).text().null())
                    .col(
                        ColumnDef::new(SocialConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SocialConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_social_connections_vendor_id")
                            .from(SocialConnections::Table, SocialConnections::VendorId)
                            .to(Vendors::Table, Vendors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_social_connections_vendor_active")
                    .table(SocialConnections::Table)
                    .col(SocialConnections::VendorId)
                    .col(SocialConnections::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialConnections::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SocialConnections {
    Table,
    Id,
    Platform,
    VendorId,
    IsBrandAccount,
    AccessTokenCiphertext,
    RefreshTokenCiphertext,
    TokenExpiresAt,
    PlatformUserId,
    PlatformPageId,
    AccountName,
    Username,
    AvatarUrl,
    IsActive,
    LastPostedAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}
