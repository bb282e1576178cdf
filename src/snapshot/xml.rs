//! XML snapshot codec
//!
//! A small attribute-based dialect:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <records>
//!   <record id="1">
//!     <name first="Ann" last="Smith" />
//!     <dateOfBirth>1990-01-01</dateOfBirth>
//!     <height>170</height>
//!     <money>100.00</money>
//!     <gender>F</gender>
//!   </record>
//! </records>
//! ```
//!
//! The reader is purpose-built for exactly this shape; it is not a
//! general XML parser.

use std::io::Write;

use crate::error::{CabinetError, Result};
use crate::record::{Money, Record};

use super::Snapshot;

impl Snapshot {
    /// Write the snapshot as XML
    pub fn to_xml<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        writeln!(writer, "<records>")?;
        for record in &self.records {
            writeln!(writer, r#"  <record id="{}">"#, record.id)?;
            writeln!(
                writer,
                r#"    <name first="{}" last="{}" />"#,
                escape(&record.first_name),
                escape(&record.last_name)
            )?;
            writeln!(
                writer,
                "    <dateOfBirth>{}</dateOfBirth>",
                record.date_of_birth.format("%Y-%m-%d")
            )?;
            writeln!(writer, "    <height>{}</height>", record.height)?;
            writeln!(writer, "    <money>{}</money>", record.money)?;
            writeln!(writer, "    <gender>{}</gender>", escape(&record.gender.to_string()))?;
            writeln!(writer, "  </record>")?;
        }
        writeln!(writer, "</records>")?;
        Ok(())
    }

    /// Parse a snapshot from XML produced by [`Snapshot::to_xml`]
    pub fn from_xml(input: &str) -> Result<Snapshot> {
        if !input.contains("<records") {
            return Err(CabinetError::Snapshot(
                "missing <records> root element".to_string(),
            ));
        }

        let mut records = Vec::new();
        let mut rest = input;

        while let Some(start) = rest.find("<record ") {
            let body_start = &rest[start..];
            let end = body_start.find("</record>").ok_or_else(|| {
                CabinetError::Snapshot("unterminated <record> element".to_string())
            })?;
            let body = &body_start[..end];

            records.push(parse_record(body)?);
            rest = &body_start[end + "</record>".len()..];
        }

        Ok(Snapshot::new(records))
    }
}

fn parse_record(body: &str) -> Result<Record> {
    let bad = |what: &str| CabinetError::Snapshot(format!("record is missing {}", what));

    // id sits on the <record> open tag itself
    let open_tag_end = body.find('>').ok_or_else(|| bad("its open tag"))?;
    let open_tag = &body[..open_tag_end];
    let id: i32 = attr(open_tag, "id")
        .ok_or_else(|| bad("an id attribute"))?
        .parse()
        .map_err(|_| CabinetError::Snapshot("bad id attribute".to_string()))?;

    // names sit on the <name .../> tag
    let name_start = body.find("<name").ok_or_else(|| bad("a <name> element"))?;
    let name_tag_end = body[name_start..]
        .find('>')
        .ok_or_else(|| bad("a closed <name> element"))?;
    let name_tag = &body[name_start..name_start + name_tag_end];
    let first_name = attr(name_tag, "first").ok_or_else(|| bad("a first attribute"))?;
    let last_name = attr(name_tag, "last").ok_or_else(|| bad("a last attribute"))?;

    let date_of_birth = element_text(body, "dateOfBirth")
        .ok_or_else(|| bad("a dateOfBirth element"))?
        .parse()
        .map_err(|_| CabinetError::Snapshot("bad dateOfBirth".to_string()))?;
    let height: i16 = element_text(body, "height")
        .ok_or_else(|| bad("a height element"))?
        .parse()
        .map_err(|_| CabinetError::Snapshot("bad height".to_string()))?;
    let money: Money = element_text(body, "money")
        .ok_or_else(|| bad("a money element"))?
        .parse()
        .map_err(|_| CabinetError::Snapshot("bad money".to_string()))?;

    let gender_text = element_text(body, "gender").ok_or_else(|| bad("a gender element"))?;
    let mut gender_chars = gender_text.chars();
    let gender = match (gender_chars.next(), gender_chars.next()) {
        (Some(c), None) => c,
        _ => return Err(CabinetError::Snapshot("bad gender".to_string())),
    };

    Ok(Record {
        id,
        first_name,
        last_name,
        date_of_birth,
        height,
        money,
        gender,
    })
}

/// Extract `name="value"` from one tag's text
fn attr(tag: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = tag.find(&marker)? + marker.len();
    let end = tag[start..].find('"')?;
    Some(unescape(&tag[start..start + end]))
}

/// Extract the text between `<tag>` and `</tag>`
fn element_text(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)?;
    Some(unescape(body[start..start + end].trim()))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
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
                last_name: "Smith & Co".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                height: 170,
                money: Money::from_major(100),
                gender: 'F',
            },
            Record {
                id: 2,
                first_name: "Bob".to_string(),
                last_name: "\"Jones\"".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 5).unwrap(),
                height: 180,
                money: Money::from_major(200),
                gender: 'M',
            },
        ])
    }

    #[test]
    fn xml_round_trip() {
        let snapshot = sample();
        let mut buf = Vec::new();
        snapshot.to_xml(&mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let parsed = Snapshot::from_xml(&text).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn empty_document_round_trips() {
        let mut buf = Vec::new();
        Snapshot::default().to_xml(&mut buf).unwrap();
        let parsed = Snapshot::from_xml(&String::from_utf8(buf).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(matches!(
            Snapshot::from_xml("<bogus/>"),
            Err(CabinetError::Snapshot(_))
        ));
    }

    #[test]
    fn truncated_record_is_an_error() {
        let text = r#"<records><record id="1"><name first="A" last="B" />"#;
        assert!(matches!(
            Snapshot::from_xml(text),
            Err(CabinetError::Snapshot(_))
        ));
    }
}
