//! # Dealcast Library
//!
//! Core functionality for the dealcast social auto-posting service:
//! credential storage, platform adapters, caption generation, and the
//! publish orchestrator, plus the HTTP trigger surface.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod social;
pub mod telemetry;
pub use migration;
