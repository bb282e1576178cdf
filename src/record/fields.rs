//! Field binding table
//!
//! Maps textual field names onto record setters so callers can apply
//! `key=value` input without any runtime reflection. Unknown field names
//! are an explicit `None` from [`setter_for`], never a lookup panic.

use chrono::NaiveDate;

use crate::error::{CabinetError, Result};

use super::{Money, Record};

/// A setter parsing one textual value into one record field
pub type FieldSetter = fn(&mut Record, &str) -> Result<()>;

/// Field-name → setter table
///
/// Names are matched case-insensitively. `id` is deliberately absent:
/// it is the record's identity, not an editable field.
const FIELD_SETTERS: &[(&str, FieldSetter)] = &[
    ("firstname", set_first_name),
    ("lastname", set_last_name),
    ("dateofbirth", set_date_of_birth),
    ("height", set_height),
    ("money", set_money),
    ("gender", set_gender),
];

/// Look up the setter for a field name (case-insensitive)
pub fn setter_for(field: &str) -> Option<FieldSetter> {
    let normalized = field.to_ascii_lowercase();
    FIELD_SETTERS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, setter)| *setter)
}

/// All bindable field names, in declaration order
pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELD_SETTERS.iter().map(|(name, _)| *name)
}

/// Apply one `field=value` pair to a record
///
/// Fails with `Validation` naming the field when the name is unknown or
/// the value does not parse.
pub fn apply_field(record: &mut Record, field: &str, value: &str) -> Result<()> {
    match setter_for(field) {
        Some(setter) => setter(record, value),
        None => Err(CabinetError::Validation(format!(
            "unknown field '{}'",
            field
        ))),
    }
}

// =============================================================================
// Setters
// =============================================================================

fn set_first_name(record: &mut Record, value: &str) -> Result<()> {
    record.first_name = value.to_string();
    Ok(())
}

fn set_last_name(record: &mut Record, value: &str) -> Result<()> {
    record.last_name = value.to_string();
    Ok(())
}

fn set_date_of_birth(record: &mut Record, value: &str) -> Result<()> {
    let date: NaiveDate = value.parse().map_err(|_| {
        CabinetError::Validation(format!("dateofbirth: '{}' is not a YYYY-MM-DD date", value))
    })?;
    record.date_of_birth = date;
    Ok(())
}

fn set_height(record: &mut Record, value: &str) -> Result<()> {
    let height: i16 = value.parse().map_err(|_| {
        CabinetError::Validation(format!("height: '{}' is not a valid number", value))
    })?;
    record.height = height;
    Ok(())
}

fn set_money(record: &mut Record, value: &str) -> Result<()> {
    let money: Money = value
        .parse()
        .map_err(|_| CabinetError::Validation(format!("money: '{}' is not a valid amount", value)))?;
    record.money = money;
    Ok(())
}

fn set_gender(record: &mut Record, value: &str) -> Result<()> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => {
            record.gender = c;
            Ok(())
        }
        _ => Err(CabinetError::Validation(format!(
            "gender: '{}' is not a single ASCII character",
            value
        ))),
    }
}
