use chrono::{Datelike, NaiveDate};
use unicode_normalization::UnicodeNormalization;

use crate::error::{FncmError, Result};
use crate::models::ProfileName;

/// Longest accepted value for any text field.
pub const MAX_FIELD_LENGTH: usize = 128;

/// Order dates are stored as `YYYY-MM-DD` text and compared as strings,
/// which only orders correctly for four-digit years.
const ORDER_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// NFC-normalize and trim a raw field value.
    #[must_use]
    pub fn normalize_text(text: &str) -> String {
        text.nfc().collect::<String>().trim().to_string()
    }

    /// Title-case a string: the first letter of every run of letters is
    /// uppercased and the rest of the run lowercased.
    ///
    /// Any non-letter (digit, apostrophe, underscore, space) ends a run, so
    /// `o'brien` becomes `O'Brien` and `my_profile` becomes `My_Profile`.
    #[must_use]
    pub fn title_case(text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut previous_is_letter = false;

        for c in text.chars() {
            if c.is_alphabetic() {
                if previous_is_letter {
                    result.extend(c.to_lowercase());
                } else {
                    result.extend(c.to_uppercase());
                }
                previous_is_letter = true;
            } else {
                result.push(c);
                previous_is_letter = false;
            }
        }

        result
    }

    /// Normalize a person or food name: trimmed and title-cased.
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        Self::title_case(&Self::normalize_text(name))
    }

    /// Validate a required text field that has already been normalized.
    pub fn require(field: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(FncmError::Validation(format!("{field} cannot be empty")));
        }

        if value.chars().count() > MAX_FIELD_LENGTH {
            return Err(FncmError::Validation(format!(
                "{field} too long (max {MAX_FIELD_LENGTH} characters)"
            )));
        }

        if value.chars().any(char::is_control) {
            return Err(FncmError::Validation(format!("{field} contains invalid characters")));
        }

        Ok(())
    }

    /// Turn a user-entered profile name into a `ProfileName`.
    ///
    /// The name is trimmed and title-cased, then rejected if it is empty,
    /// already taken by one of `existing`, or contains anything other than
    /// alphanumerics and underscores.
    pub fn sanitize_profile_name<S: AsRef<str>>(raw: &str, existing: &[S]) -> Result<ProfileName> {
        let name = Self::normalize_name(raw);

        if name.is_empty() {
            return Err(FncmError::Validation("Profile name cannot be empty".to_string()));
        }

        if existing
            .iter()
            .any(|other| Self::normalize_name(other.as_ref()) == name)
        {
            return Err(FncmError::Duplicate(format!(
                "A profile with the given name ({name}) already exists"
            )));
        }

        if let Some(bad) = name.chars().find(|c| !(c.is_alphanumeric() || *c == '_')) {
            return Err(FncmError::Validation(format!(
                "Profile name ({name}) contains a forbidden character: {bad:?}; \
                 only letters, digits and underscores are allowed"
            )));
        }

        if name.chars().count() > MAX_FIELD_LENGTH {
            return Err(FncmError::Validation(format!(
                "Profile name too long (max {MAX_FIELD_LENGTH} characters)"
            )));
        }

        Ok(ProfileName::from_trusted(name))
    }

    /// Validate an order quantity.
    pub fn validate_quantity(quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(FncmError::Validation("Quantity must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Parse an ISO 8601 calendar date (`YYYY-MM-DD`).
    pub fn parse_order_date(date: &str) -> Result<NaiveDate> {
        let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            FncmError::Validation(format!("Invalid date format: {date}, use YYYY-MM-DD"))
        })?;
        Self::require_four_digit_year(parsed)?;
        Ok(parsed)
    }

    /// Orders cannot be placed in the past.
    pub fn validate_order_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
        Self::require_four_digit_year(date)?;
        if date < today {
            return Err(FncmError::Validation(format!(
                "Order date ({date}) cannot be earlier than today ({today})"
            )));
        }

        Ok(())
    }

    fn require_four_digit_year(date: NaiveDate) -> Result<()> {
        if !ORDER_YEARS.contains(&date.year()) {
            return Err(FncmError::Validation(format!(
                "Order date ({date}) must have a year between 0001 and 9999"
            )));
        }

        Ok(())
    }
}
