//! CSV snapshot codec
//!
//! One header line, one record per line. Name fields are quoted when
//! they contain a comma, quote, or newline; quotes are doubled. A quoted
//! newline makes the record span physical lines, and the reader stitches
//! those back together.

use std::io::{BufRead, Write};

use crate::error::{CabinetError, Result};
use crate::record::{Money, Record};

use super::Snapshot;

const HEADER: &str = "id,firstname,lastname,dateofbirth,height,money,gender";

impl Snapshot {
    /// Write the snapshot as CSV
    pub fn to_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", HEADER)?;
        for record in &self.records {
            writeln!(
                writer,
                "{},{},{},{},{},{},{}",
                record.id,
                quote(&record.first_name),
                quote(&record.last_name),
                record.date_of_birth.format("%Y-%m-%d"),
                record.height,
                record.money,
                record.gender
            )?;
        }
        Ok(())
    }

    /// Parse a snapshot from CSV produced by [`Snapshot::to_csv`]
    pub fn from_csv<R: BufRead>(reader: R) -> Result<Snapshot> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => String::new(),
        };
        if header.trim() != HEADER {
            return Err(CabinetError::Snapshot(
                "missing or unrecognized CSV header".to_string(),
            ));
        }

        let mut records = Vec::new();
        let mut pending = String::new();
        let mut start = 0;
        for (number, line) in lines.enumerate() {
            let line = line?;
            if pending.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                start = number + 2;
                pending = line;
            } else {
                // A quoted field swallowed the line break; keep reading
                pending.push('\n');
                pending.push_str(&line);
            }

            let fields = match split_fields(&pending) {
                Ok(fields) => fields,
                Err(Unterminated) => continue,
            };
            let record = build_record(&fields).map_err(|reason| {
                CabinetError::Snapshot(format!("CSV line {}: {}", start, reason))
            })?;
            records.push(record);
            pending.clear();
        }

        if !pending.is_empty() {
            return Err(CabinetError::Snapshot(format!(
                "CSV line {}: unterminated quoted field",
                start
            )));
        }

        Ok(Snapshot::new(records))
    }
}

/// Quote a field when it holds a separator, quote, or newline
fn quote(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn build_record(fields: &[String]) -> std::result::Result<Record, String> {
    if fields.len() != 7 {
        return Err(format!("expected 7 fields, got {}", fields.len()));
    }

    let id: i32 = fields[0].parse().map_err(|_| "bad id".to_string())?;
    let date_of_birth = fields[3]
        .parse()
        .map_err(|_| "bad date of birth".to_string())?;
    let height: i16 = fields[4].parse().map_err(|_| "bad height".to_string())?;
    let money: Money = fields[5].parse().map_err(|_| "bad money".to_string())?;

    let mut gender_chars = fields[6].chars();
    let gender = match (gender_chars.next(), gender_chars.next()) {
        (Some(c), None) => c,
        _ => return Err("bad gender".to_string()),
    };

    Ok(Record {
        id,
        first_name: fields[1].clone(),
        last_name: fields[2].clone(),
        date_of_birth,
        height,
        money,
        gender,
    })
}

/// Marker for input ending inside a quoted field (more lines may follow)
struct Unterminated;

/// Split one CSV record, honoring quoted fields with doubled quotes
fn split_fields(line: &str) -> std::result::Result<Vec<String>, Unterminated> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if current.is_empty() => quoted = true,
            ',' if !quoted => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    if quoted {
        return Err(Unterminated);
    }
    fields.push(current);
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Snapshot {
        Snapshot::new(vec![
            Record {
                id: 1,
                first_name: "Ann".to_string(),
                last_name: "Smith".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                height: 170,
                money: Money::from_major(100),
                gender: 'F',
            },
            Record {
                id: 2,
                first_name: "Bob \"Bobby\"".to_string(),
                last_name: "Jones, Jr".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 5).unwrap(),
                height: 180,
                money: Money::from_raw(2_001_250),
                gender: 'M',
            },
        ])
    }

    #[test]
    fn csv_round_trip() {
        let snapshot = sample();
        let mut buf = Vec::new();
        snapshot.to_csv(&mut buf).unwrap();

        let parsed = Snapshot::from_csv(buf.as_slice()).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn quoted_newline_in_a_name_survives_the_round_trip() {
        let snapshot = Snapshot::new(vec![Record {
            id: 3,
            first_name: "Ann".to_string(),
            last_name: "Smith\nJones".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            height: 170,
            money: Money::from_major(100),
            gender: 'F',
        }]);
        let mut buf = Vec::new();
        snapshot.to_csv(&mut buf).unwrap();

        let parsed = Snapshot::from_csv(buf.as_slice()).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn unterminated_quote_at_end_of_input_is_rejected() {
        let input = format!("{}\n1,\"Ann,Smith,1990-01-01,170,100.00,F", super::HEADER);
        let err = Snapshot::from_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn header_is_required() {
        let result = Snapshot::from_csv("1,Ann,Smith,1990-01-01,170,100.00,F\n".as_bytes());
        assert!(matches!(result, Err(CabinetError::Snapshot(_))));
    }

    #[test]
    fn bad_lines_report_their_number() {
        let input = format!("{}\n1,Ann,Smith,not-a-date,170,100.00,F\n", super::HEADER);
        let err = Snapshot::from_csv(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
