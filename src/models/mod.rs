//! SeaORM entity models for the dealcast service.

pub mod deal;
pub mod social_connection;
pub mod social_post;
pub mod vendor;
