//! Validation Module
//!
//! Pluggable rule sets applied by the engines before add/edit. Failures
//! are `Validation` errors naming the offending field. Restore bypasses
//! validation entirely (bulk load trusts the snapshot).

use std::ops::RangeInclusive;

use chrono::{NaiveDate, Utc};

use crate::error::{CabinetError, Result};
use crate::record::Record;

/// A rule set that accepts or rejects a record with a descriptive reason
pub trait RecordValidator {
    /// Ok when the record satisfies every rule; `Validation` otherwise
    fn validate(&self, record: &Record) -> Result<()>;
}

/// Parameterized per-field rule set
///
/// The [`default_rules`](RuleSet::default_rules) and
/// [`custom_rules`](RuleSet::custom_rules) presets mirror the two
/// validation profiles the CLI offers.
pub struct RuleSet {
    name_len: RangeInclusive<usize>,
    earliest_birth: NaiveDate,
    height_range: RangeInclusive<i16>,
    allowed_genders: &'static [char],
}

impl RuleSet {
    /// The strict profile: short names, adults born 1950 or later
    pub fn default_rules() -> Self {
        Self {
            name_len: 2..=60,
            earliest_birth: NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
            height_range: 60..=272,
            allowed_genders: &['F', 'M', 'N'],
        }
    }

    /// The relaxed profile: longer names, wider ranges
    pub fn custom_rules() -> Self {
        Self {
            name_len: 1..=120,
            earliest_birth: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
            height_range: 40..=300,
            allowed_genders: &['F', 'M', 'N', 'U'],
        }
    }

    fn check_name(&self, field: &str, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CabinetError::Validation(format!(
                "{} must not be blank",
                field
            )));
        }
        if !name.is_ascii() {
            return Err(CabinetError::Validation(format!(
                "{} must be ASCII",
                field
            )));
        }
        if !self.name_len.contains(&name.len()) {
            return Err(CabinetError::Validation(format!(
                "{} must be {}..={} characters, got {}",
                field,
                self.name_len.start(),
                self.name_len.end(),
                name.len()
            )));
        }
        Ok(())
    }
}

impl RecordValidator for RuleSet {
    fn validate(&self, record: &Record) -> Result<()> {
        self.check_name("first name", &record.first_name)?;
        self.check_name("last name", &record.last_name)?;

        let today = Utc::now().date_naive();
        if record.date_of_birth < self.earliest_birth || record.date_of_birth > today {
            return Err(CabinetError::Validation(format!(
                "date of birth must be between {} and {}",
                self.earliest_birth, today
            )));
        }

        if !self.height_range.contains(&record.height) {
            return Err(CabinetError::Validation(format!(
                "height must be {}..={} cm, got {}",
                self.height_range.start(),
                self.height_range.end(),
                record.height
            )));
        }

        if record.money.is_negative() {
            return Err(CabinetError::Validation(format!(
                "money must not be negative, got {}",
                record.money
            )));
        }

        if !self.allowed_genders.contains(&record.gender) {
            return Err(CabinetError::Validation(format!(
                "gender must be one of {:?}, got '{}'",
                self.allowed_genders, record.gender
            )));
        }

        Ok(())
    }
}

/// A validator that accepts everything (testing aid)
pub struct AcceptAll;

impl RecordValidator for AcceptAll {
    fn validate(&self, _record: &Record) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Money;

    fn valid_record() -> Record {
        Record {
            id: 1,
            first_name: "Ann".to_string(),
            last_name: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            height: 170,
            money: Money::from_major(100),
            gender: 'F',
        }
    }

    #[test]
    fn accepts_a_valid_record() {
        assert!(RuleSet::default_rules().validate(&valid_record()).is_ok());
    }

    #[test]
    fn rejects_blank_and_short_names() {
        let rules = RuleSet::default_rules();

        let mut r = valid_record();
        r.first_name = "  ".to_string();
        assert!(rules.validate(&r).unwrap_err().to_string().contains("first name"));

        let mut r = valid_record();
        r.last_name = "x".to_string();
        assert!(rules.validate(&r).unwrap_err().to_string().contains("last name"));
    }

    #[test]
    fn rejects_out_of_window_birth_dates() {
        let rules = RuleSet::default_rules();

        let mut r = valid_record();
        r.date_of_birth = NaiveDate::from_ymd_opt(1949, 12, 31).unwrap();
        assert!(rules.validate(&r).unwrap_err().to_string().contains("date of birth"));

        let mut r = valid_record();
        r.date_of_birth = Utc::now().date_naive() + chrono::Days::new(1);
        assert!(rules.validate(&r).is_err());
    }

    #[test]
    fn rejects_bad_height_money_and_gender() {
        let rules = RuleSet::default_rules();

        let mut r = valid_record();
        r.height = 20;
        assert!(rules.validate(&r).unwrap_err().to_string().contains("height"));

        let mut r = valid_record();
        r.money = Money::from_raw(-1);
        assert!(rules.validate(&r).unwrap_err().to_string().contains("money"));

        let mut r = valid_record();
        r.gender = 'x';
        assert!(rules.validate(&r).unwrap_err().to_string().contains("gender"));
    }

    #[test]
    fn custom_profile_is_more_permissive() {
        let mut r = valid_record();
        r.first_name = "X".to_string();
        r.date_of_birth = NaiveDate::from_ymd_opt(1920, 6, 15).unwrap();
        r.gender = 'U';

        assert!(RuleSet::default_rules().validate(&r).is_err());
        assert!(RuleSet::custom_rules().validate(&r).is_ok());
    }
}
