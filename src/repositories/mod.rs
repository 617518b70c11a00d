//! Repository layer for database operations.

pub mod connection;
pub mod deal;
pub mod post_log;

pub use connection::ConnectionRepository;
pub use deal::DealRepository;
pub use post_log::PostLogRepository;
