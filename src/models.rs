//! Data models for clients, food items, profiles and orders
//!
//! `New*` structs carry raw user input on the way in; the plain structs are
//! rows as they are stored.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::color::{foreground_for, Foreground, Rgb};

/// A client as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    /// Database primary key
    pub id: i64,
    /// Title-cased first name
    pub first_name: String,
    /// Title-cased last name
    pub last_name: String,
    /// Postal address
    pub address: String,
    /// Phone number, free-form
    pub phone_number: String,
}

impl Client {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for a new client, as entered
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    /// First name (title-cased on insert)
    pub first_name: String,
    /// Last name (title-cased on insert)
    pub last_name: String,
    /// Postal address (trimmed on insert)
    pub address: String,
    /// Phone number (trimmed on insert)
    pub phone_number: String,
}

/// A food item as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Food {
    /// Database primary key
    pub id: i64,
    /// Unique, title-cased name
    pub food_name: String,
    /// Display color, if one was chosen
    pub color: Option<Rgb>,
}

impl Food {
    /// Readable text color for this item's background, if it has one.
    #[must_use]
    pub fn foreground(&self) -> Option<Foreground> {
        self.color.map(foreground_for)
    }
}

/// Fields for a new food item, as entered
#[derive(Debug, Clone, Default)]
pub struct NewFood {
    /// Food name (title-cased on insert)
    pub food_name: String,
    /// Optional display color
    pub color: Option<Rgb>,
}

/// A sanitized profile name.
///
/// Only [`crate::validation::InputValidator::sanitize_profile_name`] and rows
/// read back from the profiles registry produce one, so every value is
/// title-cased and limited to alphanumerics and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProfileName(String);

impl ProfileName {
    pub(crate) const fn from_trusted(name: String) -> Self {
        Self(name)
    }

    /// The name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ProfileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered profile (order ledger)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Database primary key
    pub id: i64,
    /// Sanitized name
    pub name: ProfileName,
    /// When the profile was created
    pub created_at: NaiveDateTime,
}

/// An order as stored in a profile's ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Database primary key
    pub id: i64,
    /// Owning profile
    pub profile: ProfileName,
    /// Ordering client
    pub client_id: i64,
    /// Ordered food item
    pub food_id: i64,
    /// Ordered quantity, at least 1
    pub food_quantity: u32,
    /// Delivery date
    pub date: NaiveDate,
}

/// Fields for a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Chosen client
    pub client_id: i64,
    /// Chosen food item
    pub food_id: i64,
    /// Quantity, at least 1
    pub food_quantity: u32,
    /// Delivery date, not in the past
    pub date: NaiveDate,
}

/// An order joined with its client and food, as listed in a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRow {
    /// Order primary key
    pub id: i64,
    /// Delivery date
    pub date: NaiveDate,
    /// Client first name
    pub first_name: String,
    /// Client last name
    pub last_name: String,
    /// Client address
    pub address: String,
    /// Client phone number
    pub phone_number: String,
    /// Food name
    pub food_name: String,
    /// Ordered quantity
    pub food_quantity: u32,
    /// Food display color
    pub color: Option<Rgb>,
}

impl OrderRow {
    /// Sort key used for listings: date, then first name, then last name.
    #[must_use]
    pub fn sort_key(&self) -> (NaiveDate, &str, &str) {
        (self.date, &self.first_name, &self.last_name)
    }

    /// Readable text color for this row's food cell.
    #[must_use]
    pub fn foreground(&self) -> Option<Foreground> {
        self.color.map(foreground_for)
    }
}

/// Outcome of deleting a client or food item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deleted<T> {
    /// The row as it was before deletion
    pub record: T,
    /// Orders removed with it, across all profiles
    pub orders_removed: usize,
}

/// Output format for order listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table
    Table,
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Table => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}
