//! Binary row codec
//!
//! Converts a [`Record`] to and from the fixed-width on-disk row layout.
//! Every row is exactly [`ROW_LEN`] bytes, so row N of an uncompacted
//! file starts at byte `N * ROW_LEN` and any row can be rewritten in
//! place without touching its neighbors.
//!
//! All integers are little-endian. Name fields are UTF-8, zero-padded on
//! the right; names longer than [`NAME_LEN`] bytes are silently truncated
//! at the nearest character boundary, so every encoded row stays
//! decodable. A gender outside the ASCII range is stored as `?`.

use chrono::{Datelike, NaiveDate};

use crate::error::{CabinetError, Result};
use crate::record::{Money, Record};

/// Width of each zero-padded name field in bytes
pub const NAME_LEN: usize = 120;

// Field offsets within a row
const ID_OFFSET: usize = 0;
const FIRST_NAME_OFFSET: usize = 4;
const LAST_NAME_OFFSET: usize = FIRST_NAME_OFFSET + NAME_LEN; // 124
const DAY_OFFSET: usize = LAST_NAME_OFFSET + NAME_LEN; // 244
const MONTH_OFFSET: usize = DAY_OFFSET + 4; // 248
const YEAR_OFFSET: usize = MONTH_OFFSET + 4; // 252
const HEIGHT_OFFSET: usize = YEAR_OFFSET + 4; // 256
const MONEY_OFFSET: usize = HEIGHT_OFFSET + 2; // 258
const GENDER_OFFSET: usize = MONEY_OFFSET + 16; // 274
const FLAG_OFFSET: usize = GENDER_OFFSET + 1; // 275

/// Total row width in bytes (constant for every record)
pub const ROW_LEN: usize = FLAG_OFFSET + 1; // 276

/// Liveness flag values
const FLAG_ALIVE: u8 = 0;
const FLAG_DELETED: u8 = 1;

/// Liveness state of a stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Row holds a current record
    Alive,

    /// Row is a soft-delete tombstone awaiting purge
    Deleted,
}

impl RowState {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            FLAG_ALIVE => Ok(RowState::Alive),
            FLAG_DELETED => Ok(RowState::Deleted),
            other => Err(CabinetError::MalformedFile(format!(
                "invalid liveness flag 0x{:02x}",
                other
            ))),
        }
    }

    /// Byte written at the end of each row
    pub fn as_byte(self) -> u8 {
        match self {
            RowState::Alive => FLAG_ALIVE,
            RowState::Deleted => FLAG_DELETED,
        }
    }
}

/// Encode a record into one row; liveness flag initialized to Alive
pub fn encode(record: &Record) -> [u8; ROW_LEN] {
    let mut row = [0u8; ROW_LEN];

    row[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&record.id.to_le_bytes());
    write_name(&mut row[FIRST_NAME_OFFSET..FIRST_NAME_OFFSET + NAME_LEN], &record.first_name);
    write_name(&mut row[LAST_NAME_OFFSET..LAST_NAME_OFFSET + NAME_LEN], &record.last_name);

    let dob = record.date_of_birth;
    row[DAY_OFFSET..DAY_OFFSET + 4].copy_from_slice(&(dob.day() as i32).to_le_bytes());
    row[MONTH_OFFSET..MONTH_OFFSET + 4].copy_from_slice(&(dob.month() as i32).to_le_bytes());
    row[YEAR_OFFSET..YEAR_OFFSET + 4].copy_from_slice(&dob.year().to_le_bytes());

    row[HEIGHT_OFFSET..HEIGHT_OFFSET + 2].copy_from_slice(&record.height.to_le_bytes());
    row[MONEY_OFFSET..MONEY_OFFSET + 16].copy_from_slice(&record.money.raw().to_le_bytes());
    row[GENDER_OFFSET] = if record.gender.is_ascii() {
        record.gender as u8
    } else {
        b'?'
    };
    row[FLAG_OFFSET] = FLAG_ALIVE;

    row
}

/// Decode one row back into a record and its liveness state
pub fn decode(row: &[u8]) -> Result<(Record, RowState)> {
    if row.len() != ROW_LEN {
        return Err(CabinetError::MalformedFile(format!(
            "row is {} bytes, expected {}",
            row.len(),
            ROW_LEN
        )));
    }

    let id = i32::from_le_bytes(row[ID_OFFSET..ID_OFFSET + 4].try_into().unwrap());
    let first_name = read_name(&row[FIRST_NAME_OFFSET..FIRST_NAME_OFFSET + NAME_LEN])?;
    let last_name = read_name(&row[LAST_NAME_OFFSET..LAST_NAME_OFFSET + NAME_LEN])?;

    let day = i32::from_le_bytes(row[DAY_OFFSET..DAY_OFFSET + 4].try_into().unwrap());
    let month = i32::from_le_bytes(row[MONTH_OFFSET..MONTH_OFFSET + 4].try_into().unwrap());
    let year = i32::from_le_bytes(row[YEAR_OFFSET..YEAR_OFFSET + 4].try_into().unwrap());

    let date_of_birth = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| {
            CabinetError::MalformedFile(format!(
                "invalid date of birth {:04}-{:02}-{:02}",
                year, month, day
            ))
        })?;

    let height = i16::from_le_bytes(row[HEIGHT_OFFSET..HEIGHT_OFFSET + 2].try_into().unwrap());
    let money = Money::from_raw(i128::from_le_bytes(
        row[MONEY_OFFSET..MONEY_OFFSET + 16].try_into().unwrap(),
    ));
    let gender = row[GENDER_OFFSET] as char;
    let state = RowState::from_byte(row[FLAG_OFFSET])?;

    Ok((
        Record {
            id,
            first_name,
            last_name,
            date_of_birth,
            height,
            money,
            gender,
        },
        state,
    ))
}

/// Write a name into a fixed field: truncate at NAME_LEN, zero-pad the rest
///
/// Truncation backs up to a character boundary; cutting a multi-byte
/// character in half would make the row undecodable.
fn write_name(field: &mut [u8], name: &str) {
    let mut len = name.len().min(NAME_LEN);
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
}

/// Read a name back, trimming trailing zero padding
fn read_name(field: &[u8]) -> Result<String> {
    let end = field
        .iter()
        .rposition(|&b| b != 0)
        .map(|pos| pos + 1)
        .unwrap_or(0);
    String::from_utf8(field[..end].to_vec())
        .map_err(|_| CabinetError::MalformedFile("name field is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            id: 7,
            first_name: "Ann".to_string(),
            last_name: "Smith".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            height: 170,
            money: Money::from_major(100),
            gender: 'F',
        }
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let record = sample();
        let (decoded, state) = decode(&encode(&record)).unwrap();

        assert_eq!(decoded, record);
        assert_eq!(state, RowState::Alive);
    }

    #[test]
    fn round_trip_extremes() {
        let record = Record {
            id: i32::MIN,
            first_name: "a".repeat(NAME_LEN),
            last_name: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(1, 12, 31).unwrap(),
            height: i16::MAX,
            money: Money::from_raw(i128::MAX),
            gender: '~',
        };
        let (decoded, _) = decode(&encode(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn long_names_are_silently_truncated() {
        let mut record = sample();
        record.first_name = "x".repeat(NAME_LEN + 30);

        let (decoded, _) = decode(&encode(&record)).unwrap();
        assert_eq!(decoded.first_name, "x".repeat(NAME_LEN));
    }

    #[test]
    fn truncation_never_splits_a_multi_byte_character() {
        // 119 ASCII bytes followed by a 2-byte character: a byte-level cut
        // at 120 would leave half of it behind.
        let mut record = sample();
        record.first_name = format!("{}{}", "a".repeat(NAME_LEN - 1), 'é');

        let (decoded, _) = decode(&encode(&record)).unwrap();
        assert_eq!(decoded.first_name, "a".repeat(NAME_LEN - 1));
    }

    #[test]
    fn non_ascii_gender_is_stored_as_a_placeholder() {
        let mut record = sample();
        record.gender = 'λ';

        let (decoded, _) = decode(&encode(&record)).unwrap();
        assert_eq!(decoded.gender, '?');
    }

    #[test]
    fn flipping_the_trailing_byte_marks_deletion() {
        let mut row = encode(&sample());
        row[ROW_LEN - 1] = RowState::Deleted.as_byte();

        let (decoded, state) = decode(&row).unwrap();
        assert_eq!(state, RowState::Deleted);
        assert_eq!(decoded.id, 7);
    }

    #[test]
    fn bad_flag_byte_is_malformed() {
        let mut row = encode(&sample());
        row[ROW_LEN - 1] = 0x7f;

        assert!(matches!(
            decode(&row),
            Err(CabinetError::MalformedFile(_))
        ));
    }

    #[test]
    fn bad_date_parts_are_malformed() {
        let mut row = encode(&sample());
        // month = 13
        row[248..252].copy_from_slice(&13_i32.to_le_bytes());

        assert!(matches!(
            decode(&row),
            Err(CabinetError::MalformedFile(_))
        ));
    }

    #[test]
    fn wrong_length_slice_is_malformed() {
        let row = encode(&sample());
        assert!(matches!(
            decode(&row[..ROW_LEN - 1]),
            Err(CabinetError::MalformedFile(_))
        ));
    }
}
