//! Command implementations for the commute CLI

pub mod config;
pub mod db;
pub mod serve;

// Re-export dispatcher functions for flat access from main.rs
pub use config::run_config;
pub use db::run_db;
pub use serve::run_serve;
