//! Food and Clientèle Manager
//!
//! A Rust library for keeping a small SQLite database of clients, food
//! items and per-profile order ledgers.
//!
//! # Features
//!
//! - Client and food management with duplicate detection
//! - Named profiles, each holding its own order ledger
//! - Order history with retention-based purging
//! - Readable foreground colors for colored food items
//! - CSV and JSON export of order listings

/// Food colors and foreground contrast
pub mod color;
/// Configuration management
pub mod config;
/// Database operations
pub mod db;
/// Error types
pub mod error;
/// Listing rendering and export
pub mod export;
/// Logging setup and utilities
pub mod logging;
/// Data models and structures
pub mod models;
/// Database schema definitions
pub mod schema;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use color::{foreground_for, Foreground, Rgb};
pub use db::Database;
pub use error::{FncmError, Result};
pub use models::{Client, Food, NewClient, NewFood, NewOrder, Order, OrderRow, Profile, ProfileName};
pub use validation::InputValidator;
