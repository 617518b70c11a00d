//! Database migrations for the dealcast service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_10_100000_create_vendors;
mod m2025_06_10_100100_create_deals;
mod m2025_06_10_100200_create_social_connections;
mod m2025_06_10_100300_create_social_posts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_10_100000_create_vendors::Migration),
            Box::new(m2025_06_10_100100_create_deals::Migration),
            Box::new(m2025_06_10_100200_create_social_connections::Migration),
            Box::new(m2025_06_10_100300_create_social_posts::Migration),
        ]
    }
}
