//! Record Module
//!
//! The fixed-schema person record stored by the cabinet, plus the money
//! value type and the explicit field-binding table used by callers that
//! build records from textual `key=value` input.

mod fields;
mod money;

pub use fields::{apply_field, field_names, setter_for, FieldSetter};
pub use money::Money;

use std::fmt;

use chrono::NaiveDate;

/// A single person record
///
/// `id` is unique among alive records; names are ASCII and truncated to
/// 120 bytes when persisted (see [`crate::storage::row`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Unique record identifier
    pub id: i32,

    /// First name (ASCII, ≤120 bytes persisted)
    pub first_name: String,

    /// Last name (ASCII, ≤120 bytes persisted)
    pub last_name: String,

    /// Date of birth
    pub date_of_birth: NaiveDate,

    /// Height in centimeters
    pub height: i16,

    /// Money balance (exact fixed-point decimal)
    pub money: Money,

    /// Gender marker, one ASCII character
    pub gender: char,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}, {} {}, {}, {} cm, {}, {}",
            self.id,
            self.first_name,
            self.last_name,
            self.date_of_birth.format("%Y-%m-%d"),
            self.height,
            self.money,
            self.gender
        )
    }
}
